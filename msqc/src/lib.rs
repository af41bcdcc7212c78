// chart module
pub mod chart {
    pub mod constants;
    pub mod row;
    pub mod range;
    pub mod stats;
    pub mod pareto;
}

// legend module
pub mod legend {
    pub mod identifier;
    pub mod index;
}
