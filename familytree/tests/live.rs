//! The functional scenarios, run against the FamilySearch sandbox.
//!
//! Requires `FAMILYSEARCH_USERNAME`, `FAMILYSEARCH_PASSWORD`, and
//! `FAMILYSEARCH_CLIENT_ID`; run with `cargo test -- --ignored`.

mod shared;
use shared::Fixture;

macro_rules! live_tests {
    ($($name:ident),+ $(,)?) => {
        $(
            #[test]
            #[ignore = "requires FamilySearch sandbox credentials"]
            fn $name() -> miette::Result<()> {
                let Some(fx) = Fixture::live()? else {
                    eprintln!("skipping: no credentials configured");
                    return Ok(());
                };

                shared::$name(&fx)
            }
        )+
    };
}

live_tests!(
    create_child_and_parents_relationship,
    create_child_and_parents_relationship_conclusion,
    create_couple_relationship,
    read_child_and_parents_relationship,
    update_child_and_parents_relationship,
    update_child_and_parents_relationship_conclusion,
    delete_and_restore_child_and_parents_relationship,
    delete_child_and_parents_relationship_conclusion,
    delete_parent_from_relationship,
);
