#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use ark_ff::Field;
    use ark_relations::r1cs::{ConstraintLayer, ConstraintSystemRef, TracingMode::OnlyConstraints};
    use tracing_subscriber::layer::SubscriberExt;

    /// Prints the first unsatisfied constraint of `cs`, if any
    pub fn print_unsatisfied_constraints<F: Field>(cs: ConstraintSystemRef<F>) {
        if !cs.is_satisfied().unwrap() {
            println!("=========================================================");
            println!("Unsatisfied constraints:");
            println!("{}", cs.which_is_unsatisfied().unwrap().unwrap());
            println!("=========================================================");
        }
    }

    /// Runs `f` with the constraint tracing layer installed, so that unsatisfied constraints
    /// are reported with their namespace
    pub fn run_profile_constraints<T>(f: impl FnOnce() -> T) -> T {
        let mut layer = ConstraintLayer::default();
        layer.mode = OnlyConstraints;
        let subscriber = tracing_subscriber::Registry::default().with(layer);
        tracing::subscriber::with_default(subscriber, f)
    }
}
