use std::fmt;
use std::str::FromStr;

const ARN_PREFIX: &str = "arn:";
const STATE_MACHINE_RESOURCE: &str = "stateMachine:";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ArnError {
    #[error("arn: invalid prefix")]
    InvalidPrefix,
    #[error("arn: not enough sections")]
    NotEnoughSections,
}

/// An Amazon Resource Name, `arn:partition:service:region:account-id:resource`.
///
/// The resource keeps any `:` it contains, so `stateMachine:name` stays one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arn {
    pub partition: String,
    pub service: String,
    pub region: String,
    pub account_id: String,
    pub resource: String,
}

impl Arn {
    /// ARN of the execution named `execution_name` of this state machine.
    pub fn execution_arn(&self, execution_name: &str) -> String {
        let state_machine = self.resource.replacen(STATE_MACHINE_RESOURCE, "", 1);
        format!(
            "arn:{}:states:{}:{}:execution:{}:{}",
            self.partition, self.region, self.account_id, state_machine, execution_name
        )
    }
}

impl FromStr for Arn {
    type Err = ArnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.starts_with(ARN_PREFIX) {
            return Err(ArnError::InvalidPrefix);
        }
        let sections: Vec<&str> = s.splitn(6, ':').collect();
        if let [_, partition, service, region, account_id, resource] = sections[..] {
            Ok(Self {
                partition: partition.to_string(),
                service: service.to_string(),
                region: region.to_string(),
                account_id: account_id.to_string(),
                resource: resource.to_string(),
            })
        } else {
            Err(ArnError::NotEnoughSections)
        }
    }
}

impl fmt::Display for Arn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arn:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account_id, self.resource
        )
    }
}
