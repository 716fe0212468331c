//! The composition root: the Prestige API stack.

use prestige_types::{
    ComputeUnitDefinition, CorsPolicy, KeySchema, PermissionSet, RetentionPolicy,
    RouteDefinition, Runtime, StoreDefinition,
};

use crate::config::StackConfig;
use crate::error::TopologyResult;
use crate::topology::{ApiDefinition, Topology};

/// Cross-origin policy for every route of the API. Swap this value to
/// tighten the policy; routing does not depend on it.
pub const CORS_POLICY: CorsPolicy = CorsPolicy::ALLOW_ALL;

pub const API_NAME: &str = "Matchup Ranker API";
pub const API_DESCRIPTION: &str = "This API handles rankings through matchups.";

pub const COMPANIES_STORE: &str = "prestige-companies";
pub const MATCHUPS_STORE: &str = "prestige-matchups";

pub const RANKINGS_UNIT: &str = "Rankings";
pub const MATCHUP_UNIT: &str = "Matchup";

const CAPACITY_UNITS: u32 = 3;
const ENTRY_POINT: &str = "main";

/// Build the Prestige API topology.
pub fn prestige_api(config: &StackConfig) -> TopologyResult<Topology> {
    let companies = StoreDefinition::new(COMPANIES_STORE, KeySchema::string("Company"))
        .with_throughput(CAPACITY_UNITS, CAPACITY_UNITS)
        .with_retention(RetentionPolicy::Retain);
    let matchups = StoreDefinition::new(MATCHUPS_STORE, KeySchema::string("VerificationCode"))
        .with_throughput(CAPACITY_UNITS, CAPACITY_UNITS)
        .with_retention(RetentionPolicy::Retain);

    let rankings = ComputeUnitDefinition::new(
        RANKINGS_UNIT,
        Runtime::Go1x,
        config.artifact_dir("rankings-api"),
        ENTRY_POINT,
    );
    let matchup = ComputeUnitDefinition::new(
        MATCHUP_UNIT,
        Runtime::Go1x,
        config.artifact_dir("matchup-api"),
        ENTRY_POINT,
    );

    Topology::builder(config.stack_name.clone())
        .api(ApiDefinition::new(API_NAME, API_DESCRIPTION, CORS_POLICY))
        .store(companies)
        .store(matchups)
        .compute_unit(rankings)
        .compute_unit(matchup)
        .grant(RANKINGS_UNIT, COMPANIES_STORE, PermissionSet::READ_WRITE)
        .grant(MATCHUP_UNIT, COMPANIES_STORE, PermissionSet::READ_WRITE)
        .grant(MATCHUP_UNIT, MATCHUPS_STORE, PermissionSet::READ_WRITE)
        .route(RouteDefinition::any("rankings", RANKINGS_UNIT))
        .route(RouteDefinition::any("matchup", MATCHUP_UNIT))
        .build()
}
