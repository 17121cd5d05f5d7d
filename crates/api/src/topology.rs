//! Static Notification Topology
//!
//! Tenants, accounts, destinations and groups declared in the configuration
//! file and loaded into the repository at startup.

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use storage::{DestinationKind, RecordId, Repository};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    pub tenants: Vec<TenantSeed>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantSeed {
    pub name: String,
    #[serde(default)]
    pub accounts: Vec<AccountSeed>,
    #[serde(default)]
    pub destinations: Vec<DestinationSeed>,
    #[serde(default)]
    pub groups: Vec<GroupSeed>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSeed {
    pub name: String,
    pub aws_account_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationSeed {
    pub name: String,
    #[serde(flatten)]
    pub kind: DestinationKind,
}

/// Group members are referenced by destination name and external account id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSeed {
    pub name: String,
    #[serde(default)]
    pub destinations: Vec<String>,
    #[serde(default)]
    pub accounts: Vec<String>,
}

/// Insert every declared record into `repository`
pub fn seed(repository: &Repository, topology: &TopologyConfig) -> anyhow::Result<()> {
    for tenant_seed in &topology.tenants {
        let tenant = repository
            .create_tenant(&tenant_seed.name)
            .with_context(|| format!("tenant {}", tenant_seed.name))?;

        let mut accounts: HashMap<&str, RecordId> = HashMap::new();
        for account in &tenant_seed.accounts {
            let created = repository
                .create_aws_environment(tenant.id, &account.name, &account.aws_account_id)
                .with_context(|| format!("account {}", account.aws_account_id))?;
            accounts.insert(account.aws_account_id.as_str(), created.id);
        }

        let mut destinations: HashMap<&str, RecordId> = HashMap::new();
        for destination in &tenant_seed.destinations {
            let created = repository
                .create_destination(tenant.id, &destination.name, destination.kind.clone())
                .with_context(|| format!("destination {}", destination.name))?;
            destinations.insert(destination.name.as_str(), created.id);
        }

        for group in &tenant_seed.groups {
            let destination_ids = resolve(&destinations, &group.destinations, "destination")?;
            let account_ids = resolve(&accounts, &group.accounts, "account")?;
            repository
                .create_group(tenant.id, &group.name, &destination_ids, &account_ids)
                .with_context(|| format!("group {}", group.name))?;
        }

        info!(
            "Loaded tenant {}: {} accounts, {} destinations, {} groups",
            tenant.name,
            accounts.len(),
            destinations.len(),
            tenant_seed.groups.len()
        );
    }
    Ok(())
}

fn resolve(ids: &HashMap<&str, RecordId>, names: &[String], what: &str) -> anyhow::Result<Vec<RecordId>> {
    names
        .iter()
        .map(|name| {
            ids.get(name.as_str())
                .copied()
                .ok_or_else(|| anyhow!("unknown {} {}", what, name))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topology() -> TopologyConfig {
        serde_json::from_value(serde_json::json!({
            "tenants": [{
                "name": "Acme",
                "accounts": [{"name": "production", "aws_account_id": "123456789012"}],
                "destinations": [
                    {"name": "ops", "type": "email", "address": "ops@example.com"},
                    {"name": "on-call", "type": "telephone", "phone_number": "090-1234-5678", "country_code": "JP"}
                ],
                "groups": [{"name": "primary", "destinations": ["ops", "on-call"], "accounts": ["123456789012"]}]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_seed_topology() {
        let repository = Repository::new();
        seed(&repository, &topology()).unwrap();

        let account = repository.account_by_external_id("123456789012").unwrap();
        let groups = repository.groups_for_account(account.id).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(repository.destinations_for_group(groups[0].id).unwrap().len(), 2);
    }

    #[test]
    fn test_unknown_group_member() {
        let mut topology = topology();
        topology.tenants[0].groups[0].destinations.push("missing".to_string());

        let error = seed(&Repository::new(), &topology).unwrap_err();
        assert!(error.to_string().contains("unknown destination missing"));
    }
}
