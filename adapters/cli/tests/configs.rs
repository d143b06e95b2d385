use std::{fs, path::Path};

use hexstack_core::{CellId, ColorCategory, SessionConfig};
use hexstack_system_session::Session;

fn load(name: &str) -> SessionConfig {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../configs")
        .join(name);
    let source = fs::read_to_string(&path).expect("config file is readable");
    toml::from_str(&source).expect("config file parses")
}

#[test]
fn tutorial_opening_fans_in_on_the_centre() {
    use ColorCategory::{Blue, Red};

    let mut session = Session::new(load("tutorial.toml"));
    let hint = session.hint().expect("opening hint");
    assert_eq!(hint.cell, CellId::new(9));
    assert_eq!(hint.stack, session.active_stacks()[1].id());

    session
        .place_stack(hint.stack, hint.cell)
        .expect("hinted placement");
    session.resolve_cascade();

    let field = session.field();
    assert_eq!(
        field.stack_at(CellId::new(9)).map(|stack| stack.colors()),
        Some(vec![Blue, Red, Red, Red, Red, Red])
    );
    assert_eq!(
        field.stack_at(CellId::new(8)).map(|stack| stack.colors()),
        Some(vec![Blue, Blue])
    );
    assert_eq!(session.outcome(), None);
}
