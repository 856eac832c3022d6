use deferred::{Deferred, Schedule, Scheduler};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let scheduler = Scheduler::new();
    let handle = scheduler.handle();

    info!("step one");
    let handle_cl = handle.clone();
    let promise = Deferred::<String, String>::new(&handle, move |settler| {
        info!("step two");
        handle_cl.schedule(Box::new(move || {
            settler.fulfill("this time".into());
            // Ignored: the value already settled.
            settler.reject("next time".into());
            info!("step four");
        }));
        Ok(())
    });

    let _ = promise
        .then(
            |value| {
                info!(%value, "first link fulfilled");
                Ok(())
            },
            |reason| {
                info!(%reason, "first link rejected");
                Ok(())
            },
        )
        .then(
            |()| {
                info!("second link fulfilled");
                Ok::<_, String>(())
            },
            |reason| {
                info!(%reason, "second link rejected");
                Ok(())
            },
        );
    info!("step three");

    match scheduler.run_all() {
        Ok(ran) => info!(ran, "all jobs done"),
        Err(err) => info!(%err, "scheduler stopped early"),
    }
}
