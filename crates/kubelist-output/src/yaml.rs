use kubelist_types::DisplayRecord;

use crate::{DeploymentList, OutputError};

pub struct YamlFormatter;

impl YamlFormatter {
    pub fn format(records: &[DisplayRecord]) -> Result<String, OutputError> {
        serde_yaml::to_string(&DeploymentList::new(records)).map_err(OutputError::Yaml)
    }
}
