use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use roost_api::errors::ActorError;
use roost_api::prelude::*;

use test_helpers::{eventually, setup_pool_system, setup_test_system, Echo, TIMEOUT};

struct Parent;

impl Actor for Parent {
    fn receive(&mut self, _ctx: &mut dyn ActorContext, _msg: &Message) -> ActorResult<()> {
        Ok(())
    }

    fn pre_start(&mut self, ctx: &mut dyn ActorContext) -> ActorResult<()> {
        ctx.actor_of(&Props::empty(), Some("b"))?;
        Ok(())
    }
}

struct FailingStart;

impl Actor for FailingStart {
    fn receive(&mut self, _ctx: &mut dyn ActorContext, _msg: &Message) -> ActorResult<()> {
        Ok(())
    }

    fn pre_start(&mut self, _ctx: &mut dyn ActorContext) -> ActorResult<()> {
        Err(ActorError::InitializationError("pre_start refused".into()))
    }
}

#[test]
fn test_end_to_end_tree() -> Result<()> {
    let system = setup_test_system("tree")?;

    let a = system.actor_of(&Props::create(|| Parent), Some("a"))?;
    let b = a.child("b");
    assert!(!b.is_nobody());

    let resolved = system.resolve_actor_ref_str("/user/a/b")?;
    assert_eq!(resolved, b);
    assert_eq!(b.path().to_string(), "roost://tree/user/a/b");

    let again = system.actor_of(&Props::create(|| Parent), Some("a"));
    assert!(matches!(again, Err(ActorError::DuplicateName(name)) if name == "a"));

    let user = system.guardian()?;
    let children = user.children();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].path().name(), "a");
    Ok(())
}

#[test]
fn test_names_are_unique_per_parent() -> Result<()> {
    let system = setup_test_system("unique")?;

    let first = system.actor_of(&Props::create(|| Echo), Some("worker"))?;
    let duplicate = system.actor_of(&Props::create(|| Echo), Some("worker"));
    assert!(matches!(duplicate, Err(ActorError::DuplicateName(_))));

    // the same name is free under another parent
    let sibling_tree = system.system_actor_of(&Props::create(|| Echo), Some("worker"))?;
    assert_ne!(first, sibling_tree);
    assert_eq!(system.guardian()?.child("worker"), first);
    Ok(())
}

#[test]
fn test_invalid_names_are_rejected() -> Result<()> {
    let system = setup_test_system("names")?;

    for name in ["", "a/b", "with space", "#1", "$reserved"] {
        let result = system.actor_of(&Props::empty(), Some(name));
        assert!(
            matches!(result, Err(ActorError::InvalidActorName(_))),
            "name {:?} should be rejected",
            name
        );
    }
    assert!(system.guardian()?.children().is_empty());
    Ok(())
}

#[test]
fn test_synthesized_names_and_monotonic_uids() -> Result<()> {
    let system = setup_test_system("uids")?;

    let mut uids = Vec::new();
    let mut names = HashSet::new();
    for _ in 0..5 {
        let child = system.actor_of(&Props::empty(), None)?;
        assert!(child.path().name().starts_with('$'));
        names.insert(child.path().name().to_string());
        uids.push(child.path().uid());
    }

    assert_eq!(names.len(), 5);
    assert!(uids.windows(2).all(|w| w[0] < w[1]));
    Ok(())
}

#[test]
fn test_failed_creation_consumes_uid() -> Result<()> {
    let system = setup_test_system("uid-gap")?;

    let first = system.actor_of(&Props::empty(), Some("first"))?;
    let failed = Props::try_create(|_| -> ActorResult<Echo> {
        Err(ActorError::InitializationError("nope".into()))
    });
    assert!(system.actor_of(&failed, Some("second")).is_err());
    let third = system.actor_of(&Props::empty(), Some("third"))?;

    assert!(third.path().uid() > first.path().uid() + 1);
    Ok(())
}

#[test]
fn test_constructor_error_rolls_back_reservation() -> Result<()> {
    let system = setup_test_system("rollback")?;
    let failing = Props::try_create(|_| -> ActorResult<Echo> {
        Err(ActorError::InitializationError("constructor refused".into()))
    });

    let result = system.actor_of(&failing, Some("x"));
    assert!(matches!(
        result,
        Err(ActorError::InitializationError(msg)) if msg == "constructor refused"
    ));

    let user = system.guardian()?;
    assert!(user.child("x").is_nobody());
    assert!(user.children().is_empty());

    // the name can be claimed again
    let x = system.actor_of(&Props::create(|| Echo), Some("x"))?;
    assert_eq!(user.child("x"), x);
    Ok(())
}

#[test]
fn test_pre_start_error_rolls_back_reservation() -> Result<()> {
    let system = setup_test_system("pre-start")?;

    let result = system.actor_of(&Props::create(|| FailingStart), Some("y"));
    assert!(matches!(result, Err(ActorError::InitializationError(_))));
    assert!(system.guardian()?.child("y").is_nobody());

    system.actor_of(&Props::empty(), Some("y"))?;
    Ok(())
}

#[test]
fn test_constructor_panic_rolls_back_reservation() -> Result<()> {
    let system = setup_test_system("panic")?;
    let panicking = Props::create(|| -> Echo { panic!("constructor panicked") });

    let outcome = catch_unwind(AssertUnwindSafe(|| system.actor_of(&panicking, Some("p"))));
    assert!(outcome.is_err());

    let user = system.guardian()?;
    assert!(user.child("p").is_nobody());
    system.actor_of(&Props::empty(), Some("p"))?;
    assert_eq!(user.children().len(), 1);
    Ok(())
}

#[test]
fn test_missing_dispatcher_and_mailbox() -> Result<()> {
    let system = setup_test_system("collaborators")?;

    let result = system.actor_of(&Props::empty().with_dispatcher("nowhere"), Some("d"));
    assert!(matches!(result, Err(ActorError::DispatcherNotFound(id)) if id == "nowhere"));

    let result = system.actor_of(&Props::empty().with_mailbox("nothing"), Some("m"));
    assert!(matches!(result, Err(ActorError::MailboxNotFound(id)) if id == "nothing"));

    let user = system.guardian()?;
    assert!(user.child("d").is_nobody());
    assert!(user.child("m").is_nobody());
    Ok(())
}

#[test]
fn test_props_stay_unchanged_by_mutators() -> Result<()> {
    let base = Props::create(|| Echo);
    let tuned = base.with_dispatcher(CALLING_THREAD_DISPATCHER_ID).with_mailbox("custom");

    assert_eq!(base.dispatcher(), DEFAULT_DISPATCHER_ID);
    assert_eq!(base.mailbox(), DEFAULT_MAILBOX_ID);
    assert_eq!(tuned.dispatcher(), CALLING_THREAD_DISPATCHER_ID);
    assert_eq!(tuned.mailbox(), "custom");

    // one Props value creates any number of actors
    let system = setup_test_system("props")?;
    let one = system.actor_of(&base, None)?;
    let two = system.actor_of(&base, None)?;
    assert_ne!(one, two);
    Ok(())
}

#[test]
fn test_concurrent_creation_with_distinct_names() -> Result<()> {
    const THREADS: usize = 16;
    const PER_THREAD: usize = 20;
    let system = setup_test_system("crowd")?;
    let barrier = Barrier::new(THREADS);

    let created: Vec<ActorRef> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let (system, barrier) = (&system, &barrier);
                scope.spawn(move || {
                    barrier.wait();
                    (0..PER_THREAD)
                        .map(|i| {
                            let name = format!("w{}-{}", t, i);
                            system.actor_of(&Props::create(|| Echo), Some(&name)).unwrap()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
    });

    let user = system.guardian()?;
    assert_eq!(created.len(), THREADS * PER_THREAD);
    assert_eq!(user.children().len(), THREADS * PER_THREAD);
    let uids: HashSet<u64> = created.iter().map(|r| r.path().uid()).collect();
    assert_eq!(uids.len(), created.len());
    for actor in &created {
        assert_eq!(user.child(actor.path().name()), *actor);
    }
    Ok(())
}

#[test]
fn test_concurrent_creation_with_same_name() -> Result<()> {
    const RACERS: usize = 8;
    let system = setup_test_system("contended")?;
    let user = system.guardian()?;

    for round in 0..50 {
        let name = format!("contested-{}", round);
        let barrier = Barrier::new(RACERS);
        let results: Vec<ActorResult<ActorRef>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..RACERS)
                .map(|_| {
                    let (system, barrier, name) = (&system, &barrier, name.as_str());
                    scope.spawn(move || {
                        barrier.wait();
                        system.actor_of(&Props::create(|| Echo), Some(name))
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let winners: Vec<&ActorRef> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1, "round {} had {} winners", round, winners.len());
        for result in &results {
            if let Err(err) = result {
                assert!(matches!(err, ActorError::DuplicateName(n) if *n == name));
            }
        }
        assert_eq!(user.child(&name), *winners[0]);
    }
    assert_eq!(user.children().len(), 50);
    Ok(())
}

#[test]
fn test_concurrent_synthesized_names() -> Result<()> {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 25;
    let system = setup_test_system("anonymous")?;
    let barrier = Barrier::new(THREADS);

    let created: Vec<ActorRef> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let (system, barrier) = (&system, &barrier);
                scope.spawn(move || {
                    barrier.wait();
                    (0..PER_THREAD)
                        .map(|_| system.actor_of(&Props::empty(), None).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
    });

    let names: HashSet<String> = created.iter().map(|r| r.path().name().to_string()).collect();
    let uids: HashSet<u64> = created.iter().map(|r| r.path().uid()).collect();
    assert_eq!(names.len(), THREADS * PER_THREAD);
    assert_eq!(uids.len(), THREADS * PER_THREAD);
    assert_eq!(system.guardian()?.children().len(), THREADS * PER_THREAD);
    Ok(())
}

/// Tracks how many invocations of one actor overlap.
#[derive(Default)]
struct Overlap {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    processed: AtomicUsize,
}

struct Counted {
    overlap: Arc<Overlap>,
}

impl Actor for Counted {
    fn receive(&mut self, _ctx: &mut dyn ActorContext, _msg: &Message) -> ActorResult<()> {
        let now = self.overlap.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.overlap.max_in_flight.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_micros(50));
        self.overlap.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.overlap.processed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_invocations_never_overlap_on_worker_pool() -> Result<()> {
    const SENDERS: usize = 4;
    const PER_SENDER: usize = 200;
    let system = setup_pool_system("overlap", 4)?;

    let overlaps = [Arc::new(Overlap::default()), Arc::new(Overlap::default())];
    let actors = overlaps
        .iter()
        .map(|overlap| {
            let overlap = overlap.clone();
            system.actor_of(&Props::create(move || Counted { overlap: overlap.clone() }), None)
        })
        .collect::<ActorResult<Vec<_>>>()?;

    thread::scope(|scope| {
        for _ in 0..SENDERS {
            let actors = &actors;
            scope.spawn(move || {
                for i in 0..PER_SENDER {
                    for actor in actors {
                        actor.tell(i, None).unwrap();
                    }
                }
            });
        }
    });

    for overlap in &overlaps {
        let total = SENDERS * PER_SENDER;
        assert!(eventually(TIMEOUT * 5, || overlap.processed.load(Ordering::SeqCst) == total));
        assert_eq!(overlap.max_in_flight.load(Ordering::SeqCst), 1);
    }
    Ok(())
}
