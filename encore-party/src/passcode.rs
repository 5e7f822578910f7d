use rand::{distributions::Alphanumeric, thread_rng, Rng};

/// Length of a party join code.
pub const PASSCODE_LENGTH: usize = 6;

/// Generates a human-memorable party passcode. Stored uppercase; matching
/// is case-insensitive.
pub fn generate_passcode() -> String {
    let mut rng = thread_rng();

    std::iter::repeat(())
        .map(|_| rng.sample(Alphanumeric) as char)
        .take(PASSCODE_LENGTH)
        .collect::<String>()
        .to_uppercase()
}
