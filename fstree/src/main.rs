use std::io::{stdout, IsTerminal};

use clap::{Parser, Subcommand};
use familytree::{
    builders::{FactBuilder, PersonBuilder},
    fake::FakeFamilyTree,
    state::Kind,
    Client, ClientConfig, CollectionState, State,
};
use gedcomx::json::v1::GenderType;
use http::StatusCode;
use miette::IntoDiagnostic;

#[derive(Parser)]
#[command(version, about = "Work with the FamilySearch Family Tree")]
struct FsTreeArgs {
    /// Use a temporary in-memory tree instead of the FamilySearch API.
    /// The tree is empty on each run, so only `demo` and `person create` apply.
    #[arg(long, global = true)]
    offline: bool,

    /// Log each request and response
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Person {
        #[command(subcommand)]
        command: PersonCommands,
    },
    Couple {
        #[command(subcommand)]
        command: CoupleCommands,
    },
    ChildAndParents {
        #[command(subcommand)]
        command: ChildAndParentsCommands,
    },
    /// Create, delete, and restore a child-and-parents relationship
    Demo,
}

#[derive(Debug, Subcommand)]
enum PersonCommands {
    Create {
        #[arg(long, value_enum)]
        gender: Gender,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        living: bool,
    },
    Read {
        id: String,
    },
}

#[derive(Debug, Subcommand)]
enum CoupleCommands {
    Create { person1: String, person2: String },
    Read { id: String },
}

#[derive(Debug, Subcommand)]
enum ChildAndParentsCommands {
    Create {
        #[arg(long)]
        child: String,
        #[arg(long)]
        father: Option<String>,
        #[arg(long)]
        mother: Option<String>,
    },
    Read {
        id: String,
    },
    Delete {
        id: String,
    },
    Restore {
        id: String,
    },
    DeleteFather {
        id: String,
    },
    DeleteMother {
        id: String,
    },
    AddFatherFact {
        id: String,
        /// The date of the adoption, as free text
        #[arg(long)]
        date: Option<String>,
    },
}

impl Commands {
    /// Whether the command can run against an empty tree.
    fn works_offline(&self) -> bool {
        matches!(
            self,
            Commands::Demo | Commands::Person { command: PersonCommands::Create { .. } }
        )
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl From<Gender> for GenderType {
    fn from(value: Gender) -> GenderType {
        match value {
            Gender::Male => GenderType::Male,
            Gender::Female => GenderType::Female,
            Gender::Unknown => GenderType::Unknown,
        }
    }
}

/// Prints the outcome of one operation.
fn report<K: Kind>(label: &str, state: &State<K>) -> miette::Result<()> {
    println!("{label}: {} {}", state.status(), state.self_uri());
    if let Some(entity) = state.entity() {
        println!("{}", serde_json::to_string_pretty(entity).into_diagnostic()?);
    }

    Ok(())
}

fn connect(offline: bool) -> miette::Result<CollectionState> {
    let client = if offline {
        FakeFamilyTree::new().client()
    } else {
        Client::http(ClientConfig::from_env()?)?
    };

    let collection = CollectionState::read(client)?
        .expect_status(StatusCode::OK)?
        .authenticate()?;

    Ok(collection)
}

fn demo(collection: &CollectionState) -> miette::Result<()> {
    let father = collection
        .add_person(&PersonBuilder::male().build())?
        .expect_status(StatusCode::CREATED)?;
    let mother = collection
        .add_person(&PersonBuilder::female().build())?
        .expect_status(StatusCode::CREATED)?;
    let child = collection
        .add_person(&PersonBuilder::female().name("Emma Smith").build())?
        .expect_status(StatusCode::CREATED)?;

    let relationship = collection
        .add_child_and_parents_relationship(&child, Some(&father), Some(&mother))?
        .expect_status(StatusCode::CREATED)?;
    report("create", &relationship)?;

    let added = relationship.add_father_fact(FactBuilder::adoptive_parent())?;
    report("add father fact", &added)?;

    report("read", &relationship.get()?.expect_status(StatusCode::OK)?)?;

    let deleted = relationship.delete()?.expect_status(StatusCode::NO_CONTENT)?;
    report("delete", &deleted)?;

    let missing = deleted.get()?.expect_status(StatusCode::GONE)?;
    report("read deleted", &missing)?;

    report("restore", &missing.restore()?.expect_status(StatusCode::NO_CONTENT)?)?;
    report("read restored", &relationship.get()?.expect_status(StatusCode::OK)?)?;
    Ok(())
}

fn main() -> miette::Result<()> {
    let args = FsTreeArgs::parse();

    let level = if args.verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(stdout().is_terminal())
        .with_writer(std::io::stderr)
        .init();

    miette::set_hook(Box::new(|_| {
        Box::new(miette::MietteHandlerOpts::default().terminal_links(false).build())
    }))?;

    if args.offline && !args.command.works_offline() {
        miette::bail!(
            code = "fstree::offline",
            help = "the offline tree starts empty on every run; try `fstree --offline demo`",
            "this command reads existing resources, so it cannot run with --offline"
        );
    }

    let collection = connect(args.offline)?;
    tracing::info!(uri = %collection.self_uri(), "connected");

    match args.command {
        Commands::Demo => demo(&collection)?,

        Commands::Person { command } => match command {
            PersonCommands::Create { gender, name, living } => {
                let mut builder = PersonBuilder::new(gender.into()).living(living);
                if let Some(name) = name {
                    builder = builder.name(name);
                }

                let person = collection.add_person(&builder.build())?;
                report("create", &person)?;
            }
            PersonCommands::Read { id } => report("read", &collection.read_person(&id)?)?,
        },

        Commands::Couple { command } => match command {
            CoupleCommands::Create { person1, person2 } => {
                let person1 = collection.read_person(&person1)?.expect_status(StatusCode::OK)?;
                let person2 = collection.read_person(&person2)?.expect_status(StatusCode::OK)?;
                let couple = collection.add_spouse_relationship(&person1, &person2)?;
                report("create", &couple)?;
            }
            CoupleCommands::Read { id } => report("read", &collection.read_relationship(&id)?)?,
        },

        Commands::ChildAndParents { command } => {
            let read_person = |id: Option<String>| -> miette::Result<_> {
                match id {
                    Some(id) => Ok(Some(collection.read_person(&id)?.expect_status(StatusCode::OK)?)),
                    None => Ok(None),
                }
            };

            let read = |id: &str| collection.read_child_and_parents_relationship(id);

            match command {
                ChildAndParentsCommands::Create { child, father, mother } => {
                    let child = collection.read_person(&child)?.expect_status(StatusCode::OK)?;
                    let father = read_person(father)?;
                    let mother = read_person(mother)?;
                    let relationship = collection.add_child_and_parents_relationship(
                        &child,
                        father.as_ref(),
                        mother.as_ref(),
                    )?;
                    report("create", &relationship)?;
                }
                ChildAndParentsCommands::Read { id } => report("read", &read(&id)?)?,
                ChildAndParentsCommands::Delete { id } => report("delete", &read(&id)?.delete()?)?,
                ChildAndParentsCommands::Restore { id } => {
                    report("restore", &read(&id)?.restore()?)?
                }
                ChildAndParentsCommands::DeleteFather { id } => {
                    let relationship = read(&id)?.expect_status(StatusCode::OK)?;
                    report("delete father", &relationship.delete_father()?)?
                }
                ChildAndParentsCommands::DeleteMother { id } => {
                    let relationship = read(&id)?.expect_status(StatusCode::OK)?;
                    report("delete mother", &relationship.delete_mother()?)?
                }
                ChildAndParentsCommands::AddFatherFact { id, date } => {
                    let mut fact = FactBuilder::new(gedcomx::json::v1::FactType::AdoptiveParent);
                    if let Some(date) = date {
                        fact = fact.date(date);
                    }

                    report("add father fact", &read(&id)?.add_father_fact(fact.build())?)?
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use clap::Parser;
    use rstest::rstest;

    use super::FsTreeArgs;

    #[rstest]
    #[case(&["demo"], true)]
    #[case(&["person", "create", "--gender", "male"], true)]
    #[case(&["person", "read", "P-0001"], false)]
    #[case(&["couple", "create", "P-0001", "P-0002"], false)]
    #[case(&["child-and-parents", "restore", "CAPR-0001"], false)]
    fn commands_that_work_offline(#[case] command: &[&str], #[case] expected: bool) {
        let argv = ["fstree", "--offline"].into_iter().chain(command.iter().copied());
        let args = FsTreeArgs::try_parse_from(argv).unwrap();
        assert_eq!(args.command.works_offline(), expected);
    }
}
