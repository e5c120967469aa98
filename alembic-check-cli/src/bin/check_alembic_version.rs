use alembic_check_cli::version::{run, VersionArgs};

fn main() {
    alembic_check_cli::init_tracing();
    let args: VersionArgs = alembic_check_cli::parse_args();
    alembic_check_cli::exit_with(run(args));
}
