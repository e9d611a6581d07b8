//! Reporting-tree resolution: supervisor chains, subordinate trees and team
//! rollups.
//!
//! Agents are loaded into an [`OrgChart`] arena: a `Vec<Agent>`, an id → index
//! map, and a per-node list of child indices built from the `supervisor_id`
//! parent pointers. Every walk carries a visited set, so a corrupted
//! reporting graph (A → B → A) terminates instead of looping.
//!
//! # Terminology
//!
//! - **Supervisor chain**: ancestors of an agent, nearest first.
//! - **Subordinate tree**: the agent plus every *active* descendant.
//! - **Downline**: every descendant id, active or not, used for rollups.

use rusqlite::Connection;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use crate::db::query;
use crate::error::{IntakeError, StorageContext, require_id};
use crate::model::agent::{Agent, Tier};
use crate::model::status::IntakeStatus;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Arena of agents with parent pointers and a children index.
#[derive(Debug, Clone, Default)]
pub struct OrgChart {
    agents: Vec<Agent>,
    index: HashMap<String, usize>,
    children: Vec<Vec<usize>>,
}

/// One node of a subordinate tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubordinateNode {
    pub agent: Agent,
    pub children: Vec<SubordinateNode>,
}

impl SubordinateNode {
    /// Number of nodes in this subtree, including `self`.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Self::node_count).sum::<usize>()
    }
}

/// An agent with both directions of the reporting tree resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentHierarchy {
    pub agent: Agent,
    pub supervisor_chain: Vec<Agent>,
    pub subordinate_tree: SubordinateNode,
    /// Active subordinates, direct and indirect, excluding the agent.
    pub team_size: usize,
}

/// Aggregate counters across an agent and their whole downline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamRollup {
    pub agent_id: String,
    /// The agent plus every descendant.
    pub member_count: usize,
    pub total_clients: u64,
    pub approved_clients: u64,
    pub clients_by_status: BTreeMap<IntakeStatus, u64>,
    pub members_by_tier: BTreeMap<Tier, usize>,
}

// ---------------------------------------------------------------------------
// OrgChart
// ---------------------------------------------------------------------------

impl OrgChart {
    /// Load every agent from the store.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::Persistence`] if the agents cannot be read.
    pub fn load(conn: &Connection) -> Result<Self, IntakeError> {
        let agents = query::list_agents(conn).storage("load agents")?;
        Ok(Self::from_agents(agents))
    }

    /// Build the arena from a flat list. Supervisor ids that name no known
    /// agent are treated as roots.
    #[must_use]
    pub fn from_agents(agents: Vec<Agent>) -> Self {
        let index: HashMap<String, usize> = agents
            .iter()
            .enumerate()
            .map(|(i, a)| (a.agent_id.clone(), i))
            .collect();

        let mut children = vec![Vec::new(); agents.len()];
        for (i, agent) in agents.iter().enumerate() {
            if let Some(parent) = agent.supervisor_id.as_deref().and_then(|s| index.get(s)) {
                children[*parent].push(i);
            }
        }

        Self {
            agents,
            index,
            children,
        }
    }

    #[must_use]
    pub fn get(&self, agent_id: &str) -> Option<&Agent> {
        self.index.get(agent_id).map(|&i| &self.agents[i])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    fn require(&self, agent_id: &str) -> Result<usize, IntakeError> {
        self.index
            .get(agent_id)
            .copied()
            .ok_or_else(|| IntakeError::not_found("agent", agent_id))
    }

    /// Supervisors of `agent_id`, nearest first.
    ///
    /// Stops at a missing supervisor or at the first id already visited, so
    /// the result never contains duplicates or the agent itself.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::NotFound`] if `agent_id` is unknown.
    pub fn ancestor_chain(&self, agent_id: &str) -> Result<Vec<&Agent>, IntakeError> {
        let start = self.require(agent_id)?;
        let mut visited: HashSet<usize> = HashSet::from([start]);
        let mut chain = Vec::new();

        let mut next = self.parent_of(start);
        while let Some(idx) = next {
            if !visited.insert(idx) {
                tracing::warn!(agent_id, "supervisor cycle detected; truncating chain");
                break;
            }
            chain.push(&self.agents[idx]);
            next = self.parent_of(idx);
        }

        tracing::debug!(agent_id, depth = chain.len(), "resolved supervisor chain");
        Ok(chain)
    }

    fn parent_of(&self, idx: usize) -> Option<usize> {
        self.agents[idx]
            .supervisor_id
            .as_deref()
            .and_then(|s| self.index.get(s).copied())
    }

    /// Tree of active subordinates rooted at `agent_id`.
    ///
    /// The root is always included; inactive descendants and their subtrees
    /// are left out.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::NotFound`] if `agent_id` is unknown.
    pub fn subordinate_tree(&self, agent_id: &str) -> Result<SubordinateNode, IntakeError> {
        let root = self.require(agent_id)?;
        let mut visited = HashSet::new();
        Ok(self.build_subtree(root, &mut visited))
    }

    fn build_subtree(&self, idx: usize, visited: &mut HashSet<usize>) -> SubordinateNode {
        visited.insert(idx);
        let mut children = Vec::new();
        for &child in &self.children[idx] {
            if visited.contains(&child) || !self.agents[child].is_active {
                continue;
            }
            children.push(self.build_subtree(child, visited));
        }
        SubordinateNode {
            agent: self.agents[idx].clone(),
            children,
        }
    }

    /// Every descendant id of `agent_id` (active or not), breadth-first,
    /// each exactly once. The agent itself is excluded.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::NotFound`] if `agent_id` is unknown.
    pub fn all_subordinate_ids(&self, agent_id: &str) -> Result<Vec<String>, IntakeError> {
        let root = self.require(agent_id)?;
        let mut visited: HashSet<usize> = HashSet::from([root]);
        let mut queue: VecDeque<usize> = VecDeque::from([root]);
        let mut result = Vec::new();

        while let Some(current) = queue.pop_front() {
            for &child in &self.children[current] {
                if visited.insert(child) {
                    result.push(self.agents[child].agent_id.clone());
                    queue.push_back(child);
                }
            }
        }

        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Store-facing views
// ---------------------------------------------------------------------------

/// Resolve an agent's supervisor chain and subordinate tree.
///
/// # Errors
///
/// Returns [`IntakeError::Validation`] for an empty id,
/// [`IntakeError::NotFound`] for an unknown agent, or
/// [`IntakeError::Persistence`] if agents cannot be read.
pub fn get_agent_hierarchy(
    conn: &Connection,
    agent_id: &str,
) -> Result<AgentHierarchy, IntakeError> {
    require_id("agent", agent_id)?;
    let chart = OrgChart::load(conn)?;

    let supervisor_chain = chart
        .ancestor_chain(agent_id)?
        .into_iter()
        .cloned()
        .collect();
    let subordinate_tree = chart.subordinate_tree(agent_id)?;
    let team_size = subordinate_tree.node_count() - 1;

    Ok(AgentHierarchy {
        agent: subordinate_tree.agent.clone(),
        supervisor_chain,
        subordinate_tree,
        team_size,
    })
}

/// Aggregate client counts and tier breakdown for an agent's whole team.
///
/// # Errors
///
/// Returns [`IntakeError::Validation`] for an empty id,
/// [`IntakeError::NotFound`] for an unknown agent, or
/// [`IntakeError::Persistence`] on storage failure.
pub fn get_team_rollup(conn: &Connection, agent_id: &str) -> Result<TeamRollup, IntakeError> {
    require_id("agent", agent_id)?;
    let chart = OrgChart::load(conn)?;

    let mut members = vec![agent_id.to_string()];
    members.extend(chart.all_subordinate_ids(agent_id)?);

    let mut rollup = TeamRollup {
        agent_id: agent_id.to_string(),
        member_count: members.len(),
        total_clients: 0,
        approved_clients: 0,
        clients_by_status: BTreeMap::new(),
        members_by_tier: BTreeMap::new(),
    };

    for member in &members {
        if let Some(agent) = chart.get(member) {
            *rollup.members_by_tier.entry(agent.tier()).or_insert(0) += 1;
        }
        let counts = query::client_counts_for_agent(conn, member).storage("count team clients")?;
        rollup.total_clients += counts.total;
        for (status, count) in counts.by_status {
            *rollup.clients_by_status.entry(status).or_insert(0) += count;
        }
    }
    rollup.approved_clients = rollup
        .clients_by_status
        .get(&IntakeStatus::Approved)
        .copied()
        .unwrap_or(0);

    Ok(rollup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::db::query::{NewAgent, NewClient};
    use crate::model::agent::AgentRole;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("valid") + Duration::minutes(n)
    }

    fn agent(id: &str, supervisor: Option<&str>, star: u8) -> Agent {
        Agent {
            agent_id: id.into(),
            display_name: id.to_uppercase(),
            role: AgentRole::Agent,
            is_active: true,
            star_level: star,
            supervisor_id: supervisor.map(String::from),
            created_at: t(0),
        }
    }

    ///   root
    ///   ├── mid
    ///   │   ├── leaf1
    ///   │   └── leaf2 (inactive)
    ///   │       └── deep
    ///   └── side
    fn chart() -> OrgChart {
        let mut leaf2 = agent("leaf2", Some("mid"), 0);
        leaf2.is_active = false;
        OrgChart::from_agents(vec![
            agent("root", None, 4),
            agent("mid", Some("root"), 2),
            agent("leaf1", Some("mid"), 0),
            leaf2,
            agent("deep", Some("leaf2"), 1),
            agent("side", Some("root"), 3),
        ])
    }

    fn ids(agents: &[&Agent]) -> Vec<String> {
        agents.iter().map(|a| a.agent_id.clone()).collect()
    }

    #[test]
    fn ancestor_chain_is_nearest_first() {
        let chart = chart();
        assert_eq!(
            ids(&chart.ancestor_chain("deep").expect("chain")),
            vec!["leaf2", "mid", "root"]
        );
        assert!(chart.ancestor_chain("root").expect("chain").is_empty());
    }

    #[test]
    fn ancestor_chain_survives_two_node_cycle() {
        let chart = OrgChart::from_agents(vec![
            agent("a", Some("b"), 0),
            agent("b", Some("a"), 0),
        ]);
        let chain = chart.ancestor_chain("a").expect("chain");
        assert_eq!(ids(&chain), vec!["b"]);
        assert!(chain.len() <= 2);
    }

    #[test]
    fn ancestor_chain_survives_longer_cycle_entered_midway() {
        // x -> a -> b -> c -> a
        let chart = OrgChart::from_agents(vec![
            agent("x", Some("a"), 0),
            agent("a", Some("b"), 0),
            agent("b", Some("c"), 0),
            agent("c", Some("a"), 0),
        ]);
        assert_eq!(
            ids(&chart.ancestor_chain("x").expect("chain")),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn unknown_agent_is_not_found() {
        let chart = chart();
        assert!(matches!(
            chart.ancestor_chain("ghost"),
            Err(IntakeError::NotFound { entity: "agent", .. })
        ));
        assert!(chart.subordinate_tree("ghost").is_err());
        assert!(chart.all_subordinate_ids("ghost").is_err());
    }

    #[test]
    fn dangling_supervisor_is_a_root() {
        let chart = OrgChart::from_agents(vec![agent("orphan", Some("gone"), 0)]);
        assert!(chart.ancestor_chain("orphan").expect("chain").is_empty());
    }

    #[test]
    fn subordinate_tree_skips_inactive_branches() {
        let chart = chart();
        let tree = chart.subordinate_tree("root").expect("tree");
        // root, mid, leaf1, side; leaf2 and deep are pruned
        assert_eq!(tree.node_count(), 4);
        let mid = tree
            .children
            .iter()
            .find(|n| n.agent.agent_id == "mid")
            .expect("mid");
        assert_eq!(mid.children.len(), 1);
        assert_eq!(mid.children[0].agent.agent_id, "leaf1");
    }

    #[test]
    fn subordinate_tree_terminates_on_cycle() {
        let chart = OrgChart::from_agents(vec![
            agent("a", Some("b"), 0),
            agent("b", Some("a"), 0),
        ]);
        let tree = chart.subordinate_tree("a").expect("tree");
        assert_eq!(tree.node_count(), 2);
    }

    #[test]
    fn all_subordinate_ids_is_breadth_first_and_includes_inactive() {
        let chart = chart();
        assert_eq!(
            chart.all_subordinate_ids("root").expect("ids"),
            vec!["mid", "side", "leaf1", "leaf2", "deep"]
        );
        assert!(chart.all_subordinate_ids("leaf1").expect("ids").is_empty());
    }

    #[test]
    fn all_subordinate_ids_visits_each_once_on_cycle() {
        let chart = OrgChart::from_agents(vec![
            agent("a", Some("b"), 0),
            agent("b", Some("a"), 0),
        ]);
        assert_eq!(chart.all_subordinate_ids("a").expect("ids"), vec!["b"]);
    }

    fn seeded_store() -> Connection {
        let conn = db::open_in_memory().expect("store");
        let rows = [
            NewAgent::new("root", "Root").star_level(4),
            NewAgent::new("mid", "Mid").star_level(2).supervisor("root"),
            NewAgent::new("leaf", "Leaf").supervisor("mid"),
        ];
        for (i, row) in rows.iter().enumerate() {
            query::insert_agent(&conn, row, t(i64::try_from(i).expect("small"))).expect("agent");
        }
        for (client, owner) in [("c1", "leaf"), ("c2", "leaf"), ("c3", "mid")] {
            query::insert_client(
                &conn,
                &NewClient {
                    client_id: client.into(),
                    display_name: client.into(),
                    agent_id: owner.into(),
                },
                t(10),
            )
            .expect("client");
        }
        conn.execute(
            "UPDATE clients SET status = 'approved' WHERE client_id = 'c1'",
            [],
        )
        .expect("approve");
        conn
    }

    #[test]
    fn agent_hierarchy_view() {
        let conn = seeded_store();
        let view = get_agent_hierarchy(&conn, "mid").expect("view");
        assert_eq!(view.agent.agent_id, "mid");
        assert_eq!(view.supervisor_chain.len(), 1);
        assert_eq!(view.supervisor_chain[0].agent_id, "root");
        assert_eq!(view.team_size, 1);

        assert_eq!(get_agent_hierarchy(&conn, "root").expect("root").team_size, 2);
        assert!(matches!(
            get_agent_hierarchy(&conn, ""),
            Err(IntakeError::Validation(_))
        ));
    }

    #[test]
    fn team_rollup_aggregates_downline() {
        let conn = seeded_store();
        let rollup = get_team_rollup(&conn, "root").expect("rollup");
        assert_eq!(rollup.member_count, 3);
        assert_eq!(rollup.total_clients, 3);
        assert_eq!(rollup.approved_clients, 1);
        assert_eq!(rollup.clients_by_status.get(&IntakeStatus::Pending), Some(&2));
        assert_eq!(rollup.members_by_tier.get(&Tier::Platinum), Some(&1));
        assert_eq!(rollup.members_by_tier.get(&Tier::Silver), Some(&1));
        assert_eq!(rollup.members_by_tier.get(&Tier::Rookie), Some(&1));

        let leaf = get_team_rollup(&conn, "leaf").expect("rollup");
        assert_eq!(leaf.member_count, 1);
        assert_eq!(leaf.total_clients, 2);
    }
}
