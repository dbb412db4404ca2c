use anyhow::Result;
use roost::testkit::TestProbe;
use roost_api::prelude::*;

use test_helpers::{setup_test_system, Ping, TIMEOUT};

#[derive(Debug, Clone, Copy)]
struct Flip;

#[derive(Debug, Clone, Copy)]
struct Query;

#[derive(Debug, Clone, Copy)]
struct Pop;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Reply {
    Mode(&'static str, usize),
    Underflow(bool),
}

struct Switch;

impl Switch {
    fn on(_: &mut Switch, ctx: &mut dyn ActorContext, msg: &Message) -> ActorResult<()> {
        if msg.is::<Flip>() {
            return ctx.unbecome();
        }
        if msg.is::<Query>() {
            let depth = ctx.behavior_depth();
            return ctx.reply(Reply::Mode("on", depth));
        }
        Ok(())
    }
}

impl Actor for Switch {
    fn receive(&mut self, ctx: &mut dyn ActorContext, msg: &Message) -> ActorResult<()> {
        if msg.is::<Flip>() {
            ctx.become_behavior(Behavior::new(Switch::on));
        } else if msg.is::<Query>() {
            let depth = ctx.behavior_depth();
            ctx.reply(Reply::Mode("off", depth))?;
        } else if msg.is::<Pop>() {
            // the error is dropped on purpose; the invocation still fails
            let failed = ctx.unbecome().is_err();
            ctx.reply(Reply::Underflow(failed))?;
        }
        Ok(())
    }
}

/// Reports what its context exposes for each message.
struct Inspector;

#[derive(Debug)]
struct Seen {
    path: String,
    parent: Option<String>,
    sender: Option<String>,
    current_is_ping: bool,
}

impl Actor for Inspector {
    fn receive(&mut self, ctx: &mut dyn ActorContext, _msg: &Message) -> ActorResult<()> {
        let seen = Seen {
            path: ctx.path().to_string(),
            parent: ctx.parent().map(|p| p.path().to_string()),
            sender: ctx.sender().map(|s| s.path().to_string()),
            current_is_ping: ctx.current_message().is_some_and(|m| m.is::<Ping>()),
        };
        ctx.reply(seen)
    }
}

struct WrongType;

impl Actor for WrongType {
    fn receive(&mut self, ctx: &mut dyn ActorContext, msg: &Message) -> ActorResult<()> {
        if msg.is::<Flip>() {
            // behavior written for another actor type
            ctx.become_behavior(Behavior::new(Switch::on));
            return Ok(());
        }
        ctx.reply(Reply::Mode("wrong", ctx.behavior_depth()))
    }
}

#[test]
fn test_become_and_unbecome() -> Result<()> {
    let system = setup_test_system("switch")?;
    let probe = TestProbe::new(&system)?;
    let switch = system.actor_of(&Props::create(|| Switch), Some("switch"))?;

    probe.tell(&switch, Query)?;
    assert_eq!(*probe.expect_msg::<Reply>(TIMEOUT)?, Reply::Mode("off", 0));

    probe.tell(&switch, Flip)?;
    probe.tell(&switch, Query)?;
    assert_eq!(*probe.expect_msg::<Reply>(TIMEOUT)?, Reply::Mode("on", 1));
    assert_eq!(probe.last_sender(), Some(switch.clone()));

    probe.tell(&switch, Flip)?;
    probe.tell(&switch, Query)?;
    assert_eq!(*probe.expect_msg::<Reply>(TIMEOUT)?, Reply::Mode("off", 0));
    Ok(())
}

#[test]
fn test_unbecome_underflow_fails_but_actor_survives() -> Result<()> {
    let system = setup_test_system("underflow")?;
    let probe = TestProbe::new(&system)?;
    let switch = system.actor_of(&Props::create(|| Switch), Some("switch"))?;

    probe.tell(&switch, Pop)?;
    assert_eq!(*probe.expect_msg::<Reply>(TIMEOUT)?, Reply::Underflow(true));

    probe.tell(&switch, Query)?;
    assert_eq!(*probe.expect_msg::<Reply>(TIMEOUT)?, Reply::Mode("off", 0));
    assert!(!switch.is_terminated());
    Ok(())
}

#[test]
fn test_behavior_for_other_actor_type_fails() -> Result<()> {
    let system = setup_test_system("mismatch")?;
    let probe = TestProbe::new(&system)?;
    let actor = system.actor_of(&Props::create(|| WrongType), Some("wrong"))?;

    probe.tell(&actor, Flip)?;
    // the mismatched behavior rejects the message instead of replying
    probe.tell(&actor, Query)?;
    probe.expect_no_msg(test_helpers::QUIET)?;
    assert!(!actor.is_terminated());
    Ok(())
}

#[test]
fn test_context_exposes_current_invocation() -> Result<()> {
    let system = setup_test_system("inspect")?;
    let probe = TestProbe::named(&system, "probe")?;
    let inspector = system.actor_of(&Props::create(|| Inspector), Some("inspector"))?;

    probe.tell(&inspector, Ping)?;
    let seen = probe.expect_msg::<Seen>(TIMEOUT)?;

    assert_eq!(seen.path, "roost://inspect/user/inspector");
    assert_eq!(seen.parent.as_deref(), Some("roost://inspect/user"));
    assert_eq!(seen.sender.as_deref(), Some("roost://inspect/system/probe"));
    assert!(seen.current_is_ping);

    // without a sender the reply goes to dead letters
    inspector.tell(Ping, None)?;
    probe.expect_no_msg(test_helpers::QUIET)?;
    Ok(())
}
