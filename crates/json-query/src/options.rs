//! Result option flags.

/// Controls what an evaluation returns and in which order.
///
/// `VALUE` and `PATH` pick the output mode; when `PATH` is set, paths win.
/// `NODUPS` drops results whose location was already produced, and `SORT` /
/// `SORT_DESCENDING` order results by location.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct ResultOptions(u8);

impl ResultOptions {
    /// Return matched values (the default).
    pub const VALUE: ResultOptions = ResultOptions(0);
    /// Return normalized path strings.
    pub const PATH: ResultOptions = ResultOptions(1 << 0);
    /// Drop repeated locations.
    pub const NODUPS: ResultOptions = ResultOptions(1 << 1);
    /// Order by location, ascending.
    pub const SORT: ResultOptions = ResultOptions(1 << 2);
    /// Order by location, descending.
    pub const SORT_DESCENDING: ResultOptions = ResultOptions(1 << 3);

    /// Internal: locations are built even though no flag above asks for them.
    const LOCATIONS: ResultOptions = ResultOptions(1 << 7);

    pub fn from_raw(value: u8) -> Self {
        ResultOptions(value)
    }

    pub fn as_raw(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, other: ResultOptions) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Path mode, as opposed to value mode.
    pub fn wants_paths(&self) -> bool {
        self.0 & Self::PATH.0 != 0
    }

    pub fn nodups(&self) -> bool {
        self.0 & Self::NODUPS.0 != 0
    }

    pub fn sorted(&self) -> bool {
        self.0 & (Self::SORT.0 | Self::SORT_DESCENDING.0) != 0
    }

    pub fn descending(&self) -> bool {
        self.0 & Self::SORT_DESCENDING.0 != 0
    }

    /// Whether evaluation has to build locations at all.
    pub(crate) fn tracks_locations(&self) -> bool {
        self.0 != 0
    }

    /// Force location tracking without changing the output mode.
    pub(crate) fn with_locations(self) -> Self {
        self | Self::LOCATIONS
    }
}

impl std::ops::BitOr for ResultOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        ResultOptions(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for ResultOptions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}
