//! Property-based tests for the merge resolver using proptest-state-machine.
//!
//! A reference model drives random sequences of resolve / accept / cancel
//! actions; after every step the resolver must classify its own state
//! correctly, and whenever it claims to be fully resolved the merged record
//! must reflect exactly the recorded choices with untouched fields pinned to
//! the remote snapshot.

use proptest::prelude::*;
use proptest_state_machine::{prop_state_machine, ReferenceStateMachine, StateMachineTest};
use std::collections::HashMap;

use fieldscope_api::{Record, Value};

use crate::conflict::{ConflictDetector, Detection};
use crate::merge::{FieldChoice, MergeResolver, MergeState};

const FIELD_POOL: [&str; 5] = ["status", "priority", "assigned_to", "quantity", "due_date"];
const UNTOUCHED_FIELD: &str = "cost_code";

/// Reference model: which fields are conflicted and what the user chose.
#[derive(Debug, Clone)]
pub struct RefResolution {
    fields: Vec<String>,
    chosen: HashMap<String, RefChoice>,
    cancelled: bool,
}

#[derive(Debug, Clone)]
pub enum RefChoice {
    Local,
    Remote,
    Custom(i64),
}

#[derive(Debug, Clone)]
pub enum Transition {
    Resolve { field: String, choice: RefChoice },
    AcceptCurrent,
    AcceptIncoming,
    Cancel,
}

fn choice_strategy() -> BoxedStrategy<RefChoice> {
    prop_oneof![
        Just(RefChoice::Local),
        Just(RefChoice::Remote),
        (0..1000i64).prop_map(RefChoice::Custom),
    ]
    .boxed()
}

impl ReferenceStateMachine for RefResolution {
    type State = Self;
    type Transition = Transition;

    fn init_state() -> BoxedStrategy<Self::State> {
        proptest::sample::subsequence(FIELD_POOL.to_vec(), 1..=FIELD_POOL.len())
            .prop_map(|fields| RefResolution {
                fields: fields.into_iter().map(String::from).collect(),
                chosen: HashMap::new(),
                cancelled: false,
            })
            .boxed()
    }

    fn transitions(state: &Self::State) -> BoxedStrategy<Self::Transition> {
        let resolve = (
            proptest::sample::select(state.fields.clone()),
            choice_strategy(),
        )
            .prop_map(|(field, choice)| Transition::Resolve { field, choice })
            .boxed();

        prop::strategy::Union::new_weighted(vec![
            (70, resolve),
            (10, Just(Transition::AcceptCurrent).boxed()),
            (10, Just(Transition::AcceptIncoming).boxed()),
            (5, Just(Transition::Cancel).boxed()),
        ])
        .boxed()
    }

    fn preconditions(state: &Self::State, transition: &Self::Transition) -> bool {
        if state.cancelled {
            return false;
        }
        match transition {
            Transition::Resolve { field, .. } => state.fields.contains(field),
            _ => true,
        }
    }

    fn apply(mut state: Self::State, transition: &Self::Transition) -> Self::State {
        match transition {
            Transition::Resolve { field, choice } => {
                state.chosen.insert(field.clone(), choice.clone());
            }
            Transition::AcceptCurrent => {
                for field in &state.fields {
                    state.chosen.insert(field.clone(), RefChoice::Local);
                }
            }
            Transition::AcceptIncoming => {
                for field in &state.fields {
                    state.chosen.insert(field.clone(), RefChoice::Remote);
                }
            }
            Transition::Cancel => {
                state.cancelled = true;
            }
        }
        state
    }
}

/// System under test: a real resolver plus the snapshots it was built from.
pub struct ResolverUnderTest {
    resolver: MergeResolver,
    local: Record,
    remote: Record,
}

fn local_value(field: &str) -> Value {
    Value::String(format!("local {}", field))
}

fn remote_value(field: &str) -> Value {
    Value::String(format!("remote {}", field))
}

impl ResolverUnderTest {
    fn check_consistency(&self) {
        let resolver = &self.resolver;
        let fields = &resolver.conflict().conflicted_fields;
        let chosen = fields
            .iter()
            .filter(|f| resolver.choice_for(f.as_str()).is_some())
            .count();

        match resolver.state() {
            MergeState::Opened => assert_eq!(chosen, 0),
            MergeState::PartiallyResolved => {
                assert!(chosen > 0 && chosen < fields.len());
            }
            MergeState::FullyResolved | MergeState::Committed => {
                assert_eq!(chosen, fields.len());
            }
            MergeState::Cancelled => {}
        }

        if resolver.state() == MergeState::FullyResolved {
            let merged = resolver
                .merged_record()
                .expect("fully resolved merge must produce a record");
            for field in fields {
                let expected = match resolver.choice_for(field).unwrap() {
                    FieldChoice::Local => self.local.get(field).cloned(),
                    FieldChoice::Remote => self.remote.get(field).cloned(),
                    FieldChoice::Custom(value) => Some(value.clone()),
                };
                assert_eq!(merged.get(field).cloned(), expected, "field {}", field);
            }
            // Fields outside the conflict are never mutated from the remote.
            assert_eq!(
                merged.get(UNTOUCHED_FIELD),
                self.remote.get(UNTOUCHED_FIELD)
            );
            assert_eq!(merged.version, self.remote.version);
        } else if resolver.state() != MergeState::Committed {
            assert!(
                resolver.merged_record().is_err(),
                "merged record must be gated on full resolution"
            );
        }
    }
}

impl StateMachineTest for ResolverUnderTest {
    type SystemUnderTest = Self;
    type Reference = RefResolution;

    fn init_test(
        ref_state: &<Self::Reference as ReferenceStateMachine>::State,
    ) -> Self::SystemUnderTest {
        let mut local = Record::new("si-pbt")
            .with_field(UNTOUCHED_FIELD, "03-100")
            .with_version(3);
        let mut remote = Record::new("si-pbt")
            .with_field(UNTOUCHED_FIELD, "09-250")
            .with_version(5);
        for field in &ref_state.fields {
            local.set(field.clone(), local_value(field));
            remote.set(field.clone(), remote_value(field));
        }
        remote.updated_by = Some("marco".to_string());

        let resolver = match ConflictDetector::inspect(&local, &remote, &ref_state.fields) {
            Detection::Genuine(info) => MergeResolver::new(info),
            other => panic!("every pooled field differs, got {:?}", other),
        };

        ResolverUnderTest {
            resolver,
            local,
            remote,
        }
    }

    fn apply(
        mut state: Self::SystemUnderTest,
        _ref_state: &<Self::Reference as ReferenceStateMachine>::State,
        transition: <Self::Reference as ReferenceStateMachine>::Transition,
    ) -> Self::SystemUnderTest {
        match &transition {
            Transition::Resolve { field, choice } => {
                let choice = match choice {
                    RefChoice::Local => FieldChoice::Local,
                    RefChoice::Remote => FieldChoice::Remote,
                    RefChoice::Custom(i) => FieldChoice::Custom(Value::Integer(*i)),
                };
                state
                    .resolver
                    .resolve_field(field, choice)
                    .expect("preconditions admit only open resolvers and known fields");
            }
            Transition::AcceptCurrent => {
                state.resolver.accept_current().expect("resolver is open");
            }
            Transition::AcceptIncoming => {
                state.resolver.accept_incoming().expect("resolver is open");
            }
            Transition::Cancel => {
                state.resolver.cancel();
                assert_eq!(state.resolver.state(), MergeState::Cancelled);
            }
        }
        state.check_consistency();
        state
    }

    fn check_invariants(
        state: &Self::SystemUnderTest,
        _ref_state: &<Self::Reference as ReferenceStateMachine>::State,
    ) {
        state.check_consistency();
    }
}

prop_state_machine! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    #[test]
    fn merge_resolver_state_machine(sequential 1..20 => ResolverUnderTest);
}
