use kubelist_types::DisplayRecord;

use crate::{DeploymentList, OutputError};

pub struct JsonFormatter;

impl JsonFormatter {
    /// Pretty-printed envelope with a trailing newline
    pub fn format(records: &[DisplayRecord]) -> Result<String, OutputError> {
        let list = DeploymentList::new(records);
        let mut out = serde_json::to_string_pretty(&list).map_err(OutputError::Json)?;
        out.push('\n');
        Ok(out)
    }
}
