//! Live, concurrent execution of a planning state.
//!
//! ```text
//! TaskGraph::validate()                     preflight
//!   ↓
//! loop ─ lock state ─ block dependents of failed tasks
//!   │                 reserve resources of ready goals (all-or-nothing)
//!   │                 pending → ready → in_progress
//!   │    unlock
//!   ├─ BlackBoxExecutor::execute() per picked task   (Semaphore + FuturesUnordered)
//!   └─ lock state ─ release, persist code, completed | failed
//! ```

pub mod render;

pub use render::{OutputRendererPlugin, RenderEvent};

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio::sync::Semaphore;

use crate::error::GraphError;
use crate::executor::{BlackBoxExecutor, ExecutionResult};
use crate::model::{ExecutionContext, PlanningState, Task, TaskStatus};
use crate::scheduler::TaskGraph;

/// 整个规划状态放在一把锁后面：预留/释放与完成列表更新都在同一临界区内完成
pub type SharedState = Arc<Mutex<PlanningState>>;

pub fn shared(state: PlanningState) -> SharedState {
    Arc::new(Mutex::new(state))
}

fn lock(state: &Mutex<PlanningState>) -> MutexGuard<'_, PlanningState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub results: BTreeMap<String, ExecutionResult>,
    pub completed: Vec<String>,
    pub failed: Vec<String>,
    pub blocked: Vec<String>,
    /// Goals that never ran: unknown ids, or waiting on something that never completed.
    pub unresolved: Vec<String>,
    pub duration_ms: u64,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.blocked.is_empty() && self.unresolved.is_empty()
    }
}

/// 调用方提供的输入，按 task id 索引
pub type TaskInputs = HashMap<String, Map<String, Value>>;

pub struct WorkflowRunner {
    executor: BlackBoxExecutor,
    max_concurrency: usize,
    renderer: Option<Arc<dyn OutputRendererPlugin>>,
}

struct Dispatch {
    task: Task,
    inputs: Map<String, Value>,
    resource_state: Map<String, Value>,
}

impl WorkflowRunner {
    pub fn new(executor: BlackBoxExecutor, max_concurrency: usize) -> Self {
        Self {
            executor,
            max_concurrency: max_concurrency.max(1),
            renderer: None,
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn OutputRendererPlugin>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    fn emit(&self, event: RenderEvent) {
        if let Some(renderer) = &self.renderer {
            renderer.render(&event);
        }
    }

    /// Run `goals` (every task when empty) until nothing is running and nothing is ready.
    #[tracing::instrument(skip_all, fields(goals = goals.len(), max_concurrency = self.max_concurrency))]
    pub async fn run(
        &self,
        state: SharedState,
        goals: &[String],
        inputs: &TaskInputs,
    ) -> Result<RunReport, GraphError> {
        let started = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();

        let (goals, stages) = {
            let st = lock(&state);
            let graph = TaskGraph::from_tasks(st.tasks())?;
            graph.validate()?;
            let stages = graph.topological_sort()?;
            let goals = if goals.is_empty() {
                st.task_ids()
            } else {
                goals.to_vec()
            };
            (goals, stages)
        };

        self.emit(RenderEvent::RunStart {
            run_id: run_id.clone(),
            total_tasks: goals.len(),
            goals: goals.clone(),
        });
        self.emit(RenderEvent::Plan {
            run_id: run_id.clone(),
            stages,
        });

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut running = FuturesUnordered::new();
        let mut in_flight: HashSet<String> = HashSet::new();
        let mut results: BTreeMap<String, ExecutionResult> = BTreeMap::new();
        let mut outputs: HashMap<String, Map<String, Value>> = HashMap::new();

        loop {
            let (picked, newly_blocked) = {
                let mut st = lock(&state);
                let blocked = st.block_failed_dependents();
                let picked = pick_ready(&mut st, &goals, &in_flight, inputs, &outputs);
                (picked, blocked)
            };

            if !newly_blocked.is_empty() {
                self.emit(RenderEvent::TasksBlocked {
                    run_id: run_id.clone(),
                    task_ids: newly_blocked,
                });
            }

            for dispatch in picked {
                in_flight.insert(dispatch.task.id.clone());
                self.emit(RenderEvent::TaskStart {
                    run_id: run_id.clone(),
                    task_id: dispatch.task.id.clone(),
                    environment: dispatch.task.execution_environment.clone(),
                });

                let executor = self.executor.clone();
                let semaphore = semaphore.clone();
                running.push(async move {
                    let _permit = semaphore.acquire_owned().await;
                    let Dispatch {
                        mut task,
                        inputs,
                        resource_state,
                    } = dispatch;
                    let begun = Instant::now();
                    let mut context: ExecutionContext = executor
                        .prepare_context(&task, inputs)
                        .with_resource_state(resource_state);
                    let result = executor.execute(&mut task, &mut context).await;
                    (task, result, begun.elapsed().as_millis() as u64)
                });
            }

            let Some((task, result, duration_ms)) = running.next().await else {
                break;
            };
            in_flight.remove(&task.id);

            {
                let mut st = lock(&state);
                st.resource_manager.release(&task.id);
                if let Some(stored) = st.task_mut(&task.id) {
                    stored.generated_code = task.generated_code.clone();
                }
                let marked = if result.success {
                    st.mark_completed(&task.id)
                } else {
                    st.mark_failed(&task.id)
                };
                if let Err(err) = marked {
                    tracing::warn!(task_id = %task.id, error = %err, "status update rejected");
                }
            }

            tracing::info!(task_id = %task.id, success = result.success, duration_ms, "task finished");
            if result.success {
                outputs.insert(task.id.clone(), result.outputs.clone());
            }
            self.emit(RenderEvent::TaskComplete {
                run_id: run_id.clone(),
                task_id: task.id.clone(),
                duration_ms,
                result: result.clone(),
            });
            results.insert(task.id, result);
        }

        let report = {
            let st = lock(&state);
            let mut report = RunReport {
                run_id: run_id.clone(),
                results,
                duration_ms: started.elapsed().as_millis() as u64,
                ..RunReport::default()
            };
            for goal in &goals {
                match st.task(goal).map(|t| t.status) {
                    Some(TaskStatus::Completed) => report.completed.push(goal.clone()),
                    Some(TaskStatus::Failed) => report.failed.push(goal.clone()),
                    Some(TaskStatus::Blocked) => report.blocked.push(goal.clone()),
                    _ => report.unresolved.push(goal.clone()),
                }
            }
            report
        };

        tracing::info!(
            completed = report.completed.len(),
            failed = report.failed.len(),
            blocked = report.blocked.len(),
            unresolved = report.unresolved.len(),
            duration_ms = report.duration_ms,
            "run finished"
        );
        self.emit(RenderEvent::RunEnd {
            run_id,
            report: report.clone(),
        });
        Ok(report)
    }
}

/// 预留并启动所有就绪目标（调用时已持有状态锁）
fn pick_ready(
    state: &mut PlanningState,
    goals: &[String],
    in_flight: &HashSet<String>,
    inputs: &TaskInputs,
    outputs: &HashMap<String, Map<String, Value>>,
) -> Vec<Dispatch> {
    let mut picked = Vec::new();

    for id in goals {
        if in_flight.contains(id) {
            continue;
        }
        let Some(task) = state.task(id) else {
            continue;
        };
        if task.status != TaskStatus::Pending || !state.dependencies_completed(task) {
            continue;
        }

        let resources = task.required_resources.clone();
        let mut merged = Map::new();
        for dep in &task.dependencies {
            if let Some(dep_outputs) = outputs.get(dep) {
                merged.extend(dep_outputs.clone());
            }
        }
        if let Some(own) = inputs.get(id) {
            merged.extend(own.clone());
        }

        if !state.resource_manager.reserve(&resources, id) {
            tracing::debug!(task_id = %id, "resources busy, waiting");
            continue;
        }

        let Some(task) = state.task_mut(id) else {
            continue;
        };
        let started = task
            .transition_to(TaskStatus::Ready)
            .and_then(|_| task.transition_to(TaskStatus::InProgress));
        if let Err(err) = started {
            tracing::warn!(task_id = %id, error = %err, "cannot start task");
            state.resource_manager.release(id);
            continue;
        }

        let task = task.clone();
        picked.push(Dispatch {
            task,
            inputs: merged,
            resource_state: state.resource_manager.snapshot(),
        });
    }

    picked
}
