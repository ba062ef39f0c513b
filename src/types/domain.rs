bitflags::bitflags! {
    /// Selects which facets a resolver is asked to look up.
    ///
    /// A request is a set: any union of the three facets is valid,
    /// including the empty set ("resolve nothing").
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Domain: u8 {
        /// The client ("user agent") facet.
        const USER_AGENT = 1 << 0;
        /// The operating system facet.
        const OS = 1 << 1;
        /// The device facet.
        const DEVICE = 1 << 2;
        /// All three facets.
        const ALL = Self::USER_AGENT.bits() | Self::OS.bits() | Self::DEVICE.bits();
    }
}
