use crate::pg_store::vector_literal;

#[test]
fn given_vector_when_formatted_then_bracketed_and_comma_separated() {
    assert_eq!(vector_literal(&[0.5, -1.0, 0.25]), "[0.5,-1,0.25]");
}

#[test]
fn given_empty_vector_when_formatted_then_empty_brackets() {
    assert_eq!(vector_literal(&[]), "[]");
}
