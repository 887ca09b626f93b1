#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BarColor {
    #[default]
    CYAN,
    GREEN,
    RED,
}

/// Progress report sent from a worker while it assembles a component
#[derive(Debug, Clone, Default)]
pub struct WorkerStatus {
    pub progress: f32,
    pub component: String,
    pub worker_id: usize,
    pub color: BarColor,
}

impl WorkerStatus {
    pub fn new(progress: f32, component: &str, worker_id: usize, color: BarColor) -> Self {
        Self {
            progress,
            component: component.to_string(),
            worker_id,
            color,
        }
    }
}
