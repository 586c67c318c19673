pub mod cobertura;

use crate::error::Result;
use crate::model::CoverageReport;

/// Every format parser implements this trait.
pub trait Parser {
    /// Parse the input bytes into the coverage model.
    fn parse(&self, input: &[u8]) -> Result<CoverageReport>;
}
