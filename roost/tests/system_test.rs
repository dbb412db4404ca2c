use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use roost::config::Settings;
use roost::deploy::LocalDeployer;
use roost::system::ActorSystem;
use roost::testkit::TestProbe;
use roost_api::deploy::Deploy;
use roost_api::errors::ActorError;
use roost_api::prelude::*;
use roost_api::supervisor::{SupervisionDecision, SupervisorStrategy};
use serde::{Deserialize, Serialize};

use test_helpers::{inline_settings, setup_test_system, Echo, Ping, TIMEOUT};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Order {
    id: u32,
    item: String,
}

/// Reports the deployment and strategy it sees at start-up.
struct Reporter {
    listener: ActorRef,
    spawn_child: bool,
}

#[derive(Debug)]
struct StartedWith {
    path: String,
    dispatcher: Option<String>,
    strategy: SupervisorStrategy,
}

impl Actor for Reporter {
    fn receive(&mut self, _ctx: &mut dyn ActorContext, _msg: &Message) -> ActorResult<()> {
        Ok(())
    }

    fn pre_start(&mut self, ctx: &mut dyn ActorContext) -> ActorResult<()> {
        self.listener.tell(
            StartedWith {
                path: ctx.path().to_string_without_address(),
                dispatcher: ctx.deploy().and_then(|d| d.dispatcher()).map(String::from),
                strategy: ctx.supervisor_strategy(),
            },
            None,
        )?;
        if self.spawn_child {
            let listener = self.listener.clone();
            ctx.actor_of(
                &Props::create(move || Reporter {
                    listener: listener.clone(),
                    spawn_child: false,
                }),
                Some("child"),
            )?;
        }
        Ok(())
    }
}

fn reporter(listener: &ActorRef, spawn_child: bool) -> Props {
    let listener = listener.clone();
    Props::create(move || Reporter {
        listener: listener.clone(),
        spawn_child,
    })
}

#[test]
fn test_invalid_system_name() {
    assert!(matches!(
        ActorSystem::new("no spaces", Settings::default()),
        Err(ActorError::InitializationError(_))
    ));
}

#[test]
fn test_deployment_lookup_at_start() -> Result<()> {
    let deployer = Arc::new(LocalDeployer::new());
    deployer.deploy(Deploy::new("/user/deployed").with_dispatcher(CALLING_THREAD_DISPATCHER_ID));
    let system = ActorSystem::with_deployer("deploy", inline_settings(), deployer.clone())?;
    let probe = TestProbe::new(&system)?;

    system.actor_of(&reporter(probe.actor_ref(), false), Some("deployed"))?;
    let started = probe.expect_msg::<StartedWith>(TIMEOUT)?;
    assert_eq!(started.path, "/user/deployed");
    assert_eq!(started.dispatcher.as_deref(), Some(CALLING_THREAD_DISPATCHER_ID));

    system.actor_of(&reporter(probe.actor_ref(), false), Some("plain"))?;
    assert!(probe.expect_msg::<StartedWith>(TIMEOUT)?.dispatcher.is_none());
    Ok(())
}

#[test]
fn test_deployment_overrides_props() -> Result<()> {
    let deployer = Arc::new(LocalDeployer::new());
    deployer.deploy(Deploy::new("/user/broken").with_mailbox("unregistered"));
    let system = ActorSystem::with_deployer("override", inline_settings(), deployer)?;

    let result = system.actor_of(&Props::create(|| Echo), Some("broken"));
    assert!(matches!(result, Err(ActorError::MailboxNotFound(id)) if id == "unregistered"));
    assert!(system.guardian()?.child("broken").is_nobody());

    // a deploy carried by the props applies when the deployer has none
    let probe = TestProbe::new(&system)?;
    let props = reporter(probe.actor_ref(), false)
        .with_deploy(Deploy::new("/user/carried").with_dispatcher(CALLING_THREAD_DISPATCHER_ID));
    system.actor_of(&props, Some("carried"))?;
    assert_eq!(
        probe.expect_msg::<StartedWith>(TIMEOUT)?.dispatcher.as_deref(),
        Some(CALLING_THREAD_DISPATCHER_ID)
    );
    Ok(())
}

#[test]
fn test_supervisor_strategy_is_inherited() -> Result<()> {
    let system = setup_test_system("supervision")?;
    let probe = TestProbe::new(&system)?;
    let custom = SupervisorStrategy::all_for_one(SupervisionDecision::Stop)
        .with_retries(1, Duration::from_secs(1));

    let props = reporter(probe.actor_ref(), true).with_supervisor_strategy(custom);
    system.actor_of(&props, Some("parent"))?;

    let parent = probe.expect_msg::<StartedWith>(TIMEOUT)?;
    assert_eq!(parent.path, "/user/parent");
    assert_eq!(parent.strategy, custom);
    let child = probe.expect_msg::<StartedWith>(TIMEOUT)?;
    assert_eq!(child.path, "/user/parent/child");
    assert_eq!(child.strategy, custom);

    system.actor_of(&reporter(probe.actor_ref(), false), Some("orphan"))?;
    assert_eq!(
        probe.expect_msg::<StartedWith>(TIMEOUT)?.strategy,
        SupervisorStrategy::default()
    );
    Ok(())
}

#[test]
fn test_serialization_verification() -> Result<()> {
    let system = ActorSystem::new("verified", inline_settings().with_serialize_all_messages(true))?;
    system.serialization().register::<Order>();
    let probe = TestProbe::new(&system)?;
    let echo = system.actor_of(&Props::create(|| Echo), Some("echo"))?;

    let order = Order { id: 3, item: "kettle".into() };
    probe.tell(&echo, order.clone())?;
    assert_eq!(*probe.expect_msg::<Order>(TIMEOUT)?, order);

    // unregistered types are refused at the sender
    let refused = probe.tell(&echo, Ping);
    assert!(matches!(refused, Err(ActorError::Serialization(_))));

    system.serialization().exempt::<Ping>();
    probe.tell(&echo, Ping)?;
    probe.expect_msg::<Ping>(TIMEOUT)?;

    // kernel messages are exempt
    probe.watch(&echo);
    echo.stop();
    assert_eq!(probe.expect_msg::<Terminated>(TIMEOUT)?.actor, echo);
    Ok(())
}

#[test]
fn test_thread_pool_dispatcher_delivers() -> Result<()> {
    let system = ActorSystem::new("pooled", Settings::default().with_pool_size(2))?;
    let probe = TestProbe::new(&system)?;
    let echo = system.actor_of(&Props::create(|| Echo), Some("echo"))?;

    for i in 0..20u32 {
        probe.tell(&echo, i)?;
    }
    for i in 0..20u32 {
        assert_eq!(*probe.expect_msg::<u32>(TIMEOUT)?, i);
    }
    assert_eq!(probe.last_sender(), Some(echo));
    Ok(())
}

#[tokio::test]
async fn test_system_on_ambient_runtime() -> Result<()> {
    let system = ActorSystem::new("ambient", Settings::default())?;

    let a = system.actor_of(&Props::create(|| Echo), Some("a"))?;
    assert_eq!(system.resolve_actor_ref_str("/user/a")?, a);
    assert_eq!(system.name(), "ambient");
    assert!(system.dispatchers().has_dispatcher(DEFAULT_DISPATCHER_ID));
    Ok(())
}
