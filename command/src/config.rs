/// Queue configuration.
#[derive(Clone, Copy, derivative::Derivative)]
#[derivative(Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueueConfig {
    /// Timeout for every completion waited on by `Queue::wait_idle`.
    #[derivative(Default(value = "u64::max_value()"))]
    pub wait_idle_timeout_ns: u64,

    /// Move merged completion directly into a lone signal semaphore.
    /// Otherwise it goes through a sync file like with several semaphores.
    #[derivative(Default(value = "true"))]
    pub move_single_signal: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = QueueConfig::default();
        assert_eq!(config.wait_idle_timeout_ns, u64::max_value());
        assert!(config.move_single_signal);
    }
}
