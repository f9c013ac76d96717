/*!
Targets used with the [log] macros throughout the library.

No log implementation is installed by the library itself.
*/

/// Targets to be used within a [log]! macro.
pub mod targets {
    /// Logs related to [canonicalization](crate::fixpoint)
    pub const CANONICALIZE: &str = "canonicalize";

    /// Logs related to [maximal disjoint type decomposition](crate::genus::mdtd)
    pub const MDTD: &str = "mdtd";

    /// Logs related to [Rte derivatives](crate::rte::Rte::derivative)
    pub const DERIVATIVE: &str = "derivative";

    /// Logs related to [automaton](crate::automaton::Dfa) construction
    pub const AUTOMATON: &str = "automaton";

    /// Logs related to Thompson ε-NFA construction
    pub const THOMPSON: &str = "thompson";

    /// Logs related to subset construction
    pub const DETERMINIZE: &str = "determinize";

    /// Logs related to minimization
    pub const MINIMIZE: &str = "minimize";

    /// Logs related to synchronized products
    pub const PRODUCT: &str = "product";

    /// Logs related to Rte extraction from automata
    pub const EXTRACT: &str = "extract";
}
