use alembic_check_cli::migration::{run, MigrationArgs};

fn main() {
    alembic_check_cli::init_tracing();
    let args: MigrationArgs = alembic_check_cli::parse_args();
    alembic_check_cli::exit_with(run(args));
}
