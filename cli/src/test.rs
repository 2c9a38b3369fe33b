use super::*;
use pretty_assertions::assert_eq;

#[test]
fn evaluates_a_simple_expression() {
    let mut session = Session::new();
    let turn = session.eval_line("1 2 +");
    assert_eq!(turn.out.as_deref(), Some("3"));
    assert!(turn.err.is_none());
}

#[test]
fn reports_an_error_without_crashing_the_session() {
    let mut session = Session::new();
    let turn = session.eval_line("+");
    assert!(turn.out.is_none());
    assert!(turn.err.is_some());
    assert!(session.is_running());
}

#[test]
fn undo_rolls_back_the_previous_line() {
    let mut session = Session::new();
    session.eval_line("1");
    session.eval_line("2");
    let turn = session.eval_line("undo");
    assert_eq!(turn.out.as_deref(), Some("1"));
}

#[test]
fn quit_stops_the_session() {
    let mut session = Session::new();
    assert!(session.is_running());
    session.eval_line("quit");
    assert!(!session.is_running());
}

#[test]
fn a_blank_line_just_redisplays_the_stack() {
    let mut session = Session::new();
    session.eval_line("42");
    let turn = session.eval_line("");
    assert_eq!(turn.out.as_deref(), Some("42"));
}

#[test]
fn completion_lists_registered_builtins_sharing_a_prefix() {
    let session = Session::new();
    let matches = session.complete("prec");
    assert!(matches.contains(&"precision"));
}
