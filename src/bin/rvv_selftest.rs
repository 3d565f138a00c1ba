use cpu_probe::core::diagnostics::{CheckOutcome, Diagnostics, SelfTest};

fn print_outcome(outcome: &CheckOutcome) {
    let label = outcome.check.label();
    println!("Testing RVV {}...", label);
    println!("Vector length: {}", outcome.vl);
    println!("Input A:    {:#018X}, {:#018X}", outcome.a[0], outcome.a[1]);
    println!("Input B:    {:#018X}, {:#018X}", outcome.b[0], outcome.b[1]);
    println!("RVV Result: {:#018X}, {:#018X}", outcome.result[0], outcome.result[1]);
    println!("Expected:   {:#018X}, {:#018X}", outcome.expected[0], outcome.expected[1]);

    if outcome.passed() {
        println!("RVV {} test PASSED\n", label);
    } else {
        println!("RVV {} test FAILED\n", label);
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer(std::io::stderr)
        .init();

    println!("RISC-V Vector Extension Test");
    println!("============================\n");

    let run = Diagnostics::self_test();
    match &run {
        SelfTest::Exercised(outcomes) => {
            println!("Vector extension enabled for this build\n");
            for outcome in outcomes {
                print_outcome(outcome);
            }
            if outcomes.iter().all(CheckOutcome::passed) {
                println!("All RVV checks passed, the vector path can be enabled.");
            } else {
                println!("RVV checks disagree with the scalar reference, keep the scalar path.");
            }
        }
        SelfTest::Unavailable => {
            println!("Vector extension NOT enabled for this build.");
            println!("The scalar fallback path must be used.\n");
            println!("To enable RVV, build for a target with the `v` feature, e.g.");
            println!("RUSTFLAGS=\"-C target-feature=+v\" on riscv64gc-unknown-linux-gnu.");
        }
    }

    std::process::exit(run.exit_status().code());
}
