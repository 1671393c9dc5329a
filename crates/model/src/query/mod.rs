pub mod descriptor;
pub mod params;
