//! 任务状态转换规则

use super::types::TaskStatus;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },
    #[error("Cannot transition from terminal state {state}")]
    FromTerminalState { state: TaskStatus },
}

pub struct TaskTransition;

impl TaskTransition {
    /// 检查从 `from` 转换到 `to` 是否合法
    pub fn validate(from: TaskStatus, to: TaskStatus) -> Result<(), TransitionError> {
        if from.is_terminal() {
            return Err(TransitionError::FromTerminalState { state: from });
        }

        let is_valid = match (from, to) {
            // 依赖全部完成
            (TaskStatus::Pending, TaskStatus::Ready) => true,

            // 某个依赖失败
            (TaskStatus::Pending, TaskStatus::Blocked) => true,

            // 资源已预留、契约有效、输入已校验
            (TaskStatus::Ready, TaskStatus::InProgress) => true,

            (TaskStatus::InProgress, TaskStatus::Completed) => true,
            (TaskStatus::InProgress, TaskStatus::Failed) => true,

            // 启动前输入校验未通过
            (TaskStatus::Pending, TaskStatus::Failed) | (TaskStatus::Ready, TaskStatus::Failed) => {
                true
            }

            // 外部显式解除
            (TaskStatus::Blocked, TaskStatus::Pending) => true,

            _ => false,
        };

        if is_valid {
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition { from, to })
        }
    }

    /// 成功路径上的下一个状态
    pub fn next_status(current: TaskStatus) -> Option<TaskStatus> {
        match current {
            TaskStatus::Pending => Some(TaskStatus::Ready),
            TaskStatus::Ready => Some(TaskStatus::InProgress),
            TaskStatus::InProgress => Some(TaskStatus::Completed),
            TaskStatus::Blocked => Some(TaskStatus::Pending),
            TaskStatus::Completed | TaskStatus::Failed => None,
        }
    }

    pub fn status_description(status: TaskStatus) -> &'static str {
        match status {
            TaskStatus::Pending => "waiting for dependencies",
            TaskStatus::Ready => "dependencies completed",
            TaskStatus::InProgress => "resources reserved, executing",
            TaskStatus::Completed => "outputs validated",
            TaskStatus::Failed => "execution or validation failed",
            TaskStatus::Blocked => "a dependency failed",
        }
    }
}
