use fail::FailScenario;

/// Configures fail points for the lifetime of the value.
///
/// Creating the scenario serializes tests that use fail points; dropping it switches the
/// configured points off again.
pub struct FailpointScenario<'a> {
    _scenario: FailScenario<'a>,
    names: Vec<String>,
}

impl<'a> FailpointScenario<'a> {
    /// Sets every `(name, action)` pair, e.g. `("ingest_worker.before_write", "return")`.
    pub fn setup(actions: &[(&str, &str)]) -> FailpointScenario<'a> {
        let scenario = FailScenario::setup();

        let mut names = Vec::with_capacity(actions.len());
        for (name, action) in actions {
            fail::cfg(*name, action).unwrap();
            names.push((*name).to_owned());
        }

        Self {
            _scenario: scenario,
            names,
        }
    }
}

impl Drop for FailpointScenario<'_> {
    fn drop(&mut self) {
        for name in &self.names {
            fail::remove(name);
        }
    }
}
