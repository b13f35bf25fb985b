//! Resource reservation ledger.
//!
//! Holds the planning state's available-resource set. The set is derived once
//! from the resources flagged `available` and from then on changes only through
//! `reserve`/`release`; flipping `Resource::available` later has no effect here.

use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::model::Resource;

#[derive(Debug, Clone, Default)]
pub struct ResourceManager {
    /// Resources that entered the ledger as available, in declaration order.
    order: Vec<String>,
    capacity: HashMap<String, u32>,
    in_use: HashMap<String, u32>,
    /// task id -> 该任务持有的资源 id
    allocations: BTreeMap<String, Vec<String>>,
}

impl ResourceManager {
    pub fn new<'a>(resources: impl IntoIterator<Item = &'a Resource>) -> Self {
        let mut manager = Self::default();
        for resource in resources.into_iter().filter(|r| r.available) {
            if manager.capacity.contains_key(&resource.id) {
                continue;
            }
            manager.order.push(resource.id.clone());
            manager
                .capacity
                .insert(resource.id.clone(), resource.capacity.max(1));
        }
        manager
    }

    /// True while the resource has at least one free slot.
    pub fn is_available(&self, resource_id: &str) -> bool {
        match self.capacity.get(resource_id) {
            Some(cap) => self.in_use.get(resource_id).copied().unwrap_or(0) < *cap,
            None => false,
        }
    }

    /// Currently available resource ids, in declaration order.
    pub fn available(&self) -> Vec<String> {
        self.order
            .iter()
            .filter(|id| self.is_available(id))
            .cloned()
            .collect()
    }

    pub fn all_available<S: AsRef<str>>(&self, resource_ids: &[S]) -> bool {
        self.conflicts(resource_ids).is_empty()
    }

    /// Ids from `resource_ids` that cannot be reserved right now.
    pub fn conflicts<S: AsRef<str>>(&self, resource_ids: &[S]) -> Vec<String> {
        unique(resource_ids)
            .into_iter()
            .filter(|id| !self.is_available(id))
            .map(str::to_string)
            .collect()
    }

    /// 为 `task_id` 预留全部资源；任何一个不可用则一个都不占
    pub fn reserve<S: AsRef<str>>(&mut self, resource_ids: &[S], task_id: &str) -> bool {
        let wanted = unique(resource_ids);
        if wanted.iter().any(|id| !self.is_available(id)) {
            tracing::debug!(task_id, ?wanted, "reservation refused");
            return false;
        }

        let held = self.allocations.entry(task_id.to_string()).or_default();
        for id in wanted {
            *self.in_use.entry(id.to_string()).or_insert(0) += 1;
            held.push(id.to_string());
        }
        if held.is_empty() {
            self.allocations.remove(task_id);
        }
        true
    }

    /// 归还 `task_id` 持有的全部资源（可重复调用）
    pub fn release(&mut self, task_id: &str) -> Vec<String> {
        let Some(held) = self.allocations.remove(task_id) else {
            return Vec::new();
        };
        for id in &held {
            if let Some(count) = self.in_use.get_mut(id) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    self.in_use.remove(id);
                }
            }
        }
        held
    }

    pub fn allocations_of(&self, task_id: &str) -> &[String] {
        self.allocations
            .get(task_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// `(resource_id, task_id)` pairs for every live allocation.
    pub fn allocations(&self) -> Vec<(String, String)> {
        self.allocations
            .iter()
            .flat_map(|(task, ids)| ids.iter().map(move |id| (id.clone(), task.clone())))
            .collect()
    }

    /// JSON snapshot stored on execution contexts.
    pub fn snapshot(&self) -> Map<String, Value> {
        let mut out = Map::new();
        out.insert("available".into(), json!(self.available()));
        out.insert("allocations".into(), json!(self.allocations));
        out
    }
}

fn unique<S: AsRef<str>>(ids: &[S]) -> Vec<&str> {
    let mut seen = HashSet::new();
    ids.iter()
        .map(AsRef::as_ref)
        .filter(|id| seen.insert(*id))
        .collect()
}
