use std::str::FromStr;
use serde::Deserialize;

/// What a tracker shows when its item ends without completing.
///
/// - `Complete`: every tracker's progress is set to 100% when it finalizes,
///   even when cancellation cut the item short (default behaviour). The
///   tracker still reports how the item ended (`Cancelled` or `Failed`).
/// - `Partial`: cancelled or failed items keep the last progress value they
///   reported; only completed items are shown at 100%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinalizePolicy {
    #[default]
    Complete,
    Partial,
}

impl FromStr for FinalizePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "complete" => Ok(FinalizePolicy::Complete),
            "partial" => Ok(FinalizePolicy::Partial),
            other => Err(format!(
                "invalid finalize policy: {other} (expected \"complete\" or \"partial\")"
            )),
        }
    }
}
