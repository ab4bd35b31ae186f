use super::{parse_entity, parse_role};
use anyhow::Context;
use colored::*;
use core_identity::{Entity, Resource, Role};
use core_params::{Condition, FixedEnv, Word};
use permgate_engine::{EngineConfig, GrantTier, PermissionEngine};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// A permission created before any grant
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PermissionEntry {
    resource: String,
    role: String,
    manager: String,
    /// Initial unconditional holder, the manager when omitted
    entity: Option<String>,
}

/// A grant issued by the permission's manager
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GrantEntry {
    entity: String,
    resource: String,
    role: String,
    condition: Option<String>,
    #[serde(default)]
    params: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Fixture {
    #[serde(default)]
    permission: Vec<PermissionEntry>,
    #[serde(default)]
    grant: Vec<GrantEntry>,
}

pub struct Request {
    pub caller: Entity,
    pub who: Entity,
    pub resource: Resource,
    pub role: Role,
    pub args: Vec<Word>,
}

pub fn run(
    fixture_path: &Path,
    config_path: Option<&Path>,
    block_height: u64,
    timestamp: Option<u64>,
    request: &Request,
) -> anyhow::Result<bool> {
    println!("{} {}", "Checking against fixture:".bold(), fixture_path.display());

    let config = match config_path {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let timestamp = timestamp.unwrap_or_else(now);
    let engine = PermissionEngine::new(&config).with_env(FixedEnv {
        block_height,
        timestamp,
    });

    let content = fs::read_to_string(fixture_path)
        .with_context(|| format!("Failed to read fixture {}", fixture_path.display()))?;
    let (permissions, grants) = load(&engine, &content)?;
    println!("  {} Permissions: {}", "✓".green(), permissions);
    println!("  {} Grants: {}", "✓".green(), grants);
    println!("  {} Block {} at {}", "✓".green(), block_height, timestamp);

    let decision = engine.decide(
        request.caller,
        request.who,
        request.resource,
        request.role,
        &request.args,
    );
    info!(
        who = %request.who,
        caller = %request.caller,
        resource = %request.resource,
        role = %request.role,
        allowed = decision.allowed,
        tier = ?decision.tier,
        elapsed_us = decision.evaluation_time_us,
        "decision"
    );

    println!();
    match decision.tier {
        Some(tier) => println!(
            "{} ALLOWED by {} grant ({} µs)",
            "✓".green().bold(),
            match tier {
                GrantTier::Direct => "direct",
                GrantTier::Wildcard => "wildcard",
            },
            decision.evaluation_time_us
        ),
        None => println!(
            "{} DENIED ({} µs)",
            "✗".red().bold(),
            decision.evaluation_time_us
        ),
    }

    Ok(decision.allowed)
}

/// Apply a fixture to an engine, returning (permissions, grants) applied
fn load(engine: &PermissionEngine, content: &str) -> anyhow::Result<(usize, usize)> {
    let fixture: Fixture = toml::from_str(content).context("Fixture TOML parsing error")?;
    let pm = engine.manager();

    for (i, entry) in fixture.permission.iter().enumerate() {
        let manager = parse_entity(&entry.manager)
            .with_context(|| format!("permission {}: manager", i + 1))?;
        let entity = match &entry.entity {
            Some(entity) => parse_entity(entity)
                .with_context(|| format!("permission {}: entity", i + 1))?,
            None => manager,
        };
        let resource: Resource = entry
            .resource
            .parse()
            .with_context(|| format!("permission {}: resource", i + 1))?;
        let role = parse_role(&entry.role)?;
        pm.create(entity, resource, role, manager)
            .with_context(|| format!("permission {}", i + 1))?;
        debug!(%resource, %role, %manager, %entity, "fixture permission created");
    }

    for (i, entry) in fixture.grant.iter().enumerate() {
        let entity =
            parse_entity(&entry.entity).with_context(|| format!("grant {}: entity", i + 1))?;
        let resource: Resource = entry
            .resource
            .parse()
            .with_context(|| format!("grant {}: resource", i + 1))?;
        let role = parse_role(&entry.role)?;
        let raw = grant_words(entry).with_context(|| format!("grant {}: parameters", i + 1))?;

        let manager = pm.manager_of(resource, role)?.with_context(|| {
            format!("grant {}: no permission for {} on {}", i + 1, role, resource)
        })?;
        let grant = pm
            .grant(manager, entity, resource, role, &raw)
            .with_context(|| format!("grant {}", i + 1))?;
        debug!(%entity, %resource, %role, %grant, nodes = raw.len(), "fixture grant issued");
    }

    Ok((fixture.permission.len(), fixture.grant.len()))
}

fn grant_words(entry: &GrantEntry) -> anyhow::Result<Vec<Word>> {
    match (&entry.condition, entry.params.is_empty()) {
        (Some(_), false) => anyhow::bail!("use either condition or params, not both"),
        (Some(condition), true) => Ok(Condition::parse(condition)?.compile()?),
        (None, _) => entry
            .params
            .iter()
            .map(|word| word.parse::<Word>().map_err(anyhow::Error::from))
            .collect(),
    }
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
[[permission]]
resource = "0x0000000000000000000000000000000000000a99"
role = "TRANSFER"
manager = "0x000000000000000000000000000000000000003a"

[[grant]]
entity = "0x00000000000000000000000000000000000000e1"
resource = "0x0000000000000000000000000000000000000a99"
role = "TRANSFER"
condition = "arg[0] <= 100"

[[grant]]
entity = "*"
resource = "0x0000000000000000000000000000000000000a99"
role = "TRANSFER"
params = ["0xcd01000000000000000000000000000000000000000000000000000000000001"]
"#;

    fn engine() -> PermissionEngine {
        PermissionEngine::default().with_env(FixedEnv::default())
    }

    #[test]
    fn test_load_fixture() {
        let engine = engine();
        assert_eq!(load(&engine, FIXTURE).unwrap(), (1, 2));

        let user = Entity::from_low_u64(0xe1);
        let stranger = Entity::from_low_u64(0x55);
        let app = Resource::from_low_u64(0xa99);
        let role = Role::from_name("TRANSFER");

        let direct = engine.decide(user, user, app, role, &[Word::from(100u64)]);
        assert_eq!(direct.tier, Some(GrantTier::Direct));

        // literal EQ 1 is always true
        let wildcard = engine.decide(stranger, stranger, app, role, &[]);
        assert_eq!(wildcard.tier, Some(GrantTier::Wildcard));
    }

    #[test]
    fn test_bundled_transfer_fixture() {
        let engine = PermissionEngine::default().with_env(FixedEnv {
            block_height: 1_001,
            timestamp: 1_700_000_000,
        });
        let content = include_str!("../../fixtures/transfer.toml");
        assert_eq!(load(&engine, content).unwrap(), (2, 3));

        let user = Entity::from_low_u64(0xe1);
        let relay = Entity::from_low_u64(0xe2);
        let stranger = Entity::from_low_u64(0x55);
        let app = Resource::from_low_u64(0xa99);
        let transfer = Role::from_name("TRANSFER");
        let pause = Role::from_name("PAUSE");

        assert!(engine.check(user, app, transfer, &[Word::from(500u64)]));
        assert!(!engine.check(user, app, transfer, &[Word::from(501u64)]));
        assert!(engine.check(stranger, app, transfer, &[Word::from(9u64)]));
        assert!(!engine.check(stranger, app, transfer, &[Word::from(10u64)]));

        assert!(!engine.check(user, app, pause, &[]));
        assert!(engine.check_from(relay, user, app, pause, &[]));
    }

    #[test]
    fn test_grant_without_permission_fails() {
        let fixture = r#"
[[grant]]
entity = "0x00000000000000000000000000000000000000e1"
resource = "0x0000000000000000000000000000000000000a99"
role = "TRANSFER"
"#;
        let err = load(&engine(), fixture).unwrap_err();
        assert!(err.to_string().contains("grant 1"));
    }

    #[test]
    fn test_condition_and_params_conflict() {
        let entry = GrantEntry {
            entity: "*".into(),
            resource: "0x0000000000000000000000000000000000000a99".into(),
            role: "R".into(),
            condition: Some("TRUE".into()),
            params: vec!["0x1".into()],
        };
        assert!(grant_words(&entry).is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(load(&engine(), "[[grant]]\nwho = \"*\"\n").is_err());
    }
}
