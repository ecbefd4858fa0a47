use sshkeys_add::{run, Options, HELP};
use sshkeys_terminal as term;

fn main() {
    term::run_command::<Options, _>(HELP, "Adding keys", run);
}
