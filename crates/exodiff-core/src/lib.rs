pub mod compare;
pub mod dataset;
pub mod domain;
pub mod netcdf;
pub mod policy;
pub mod regression;
