use taskstats::{
    print_snapshot_report, Classifier, CompletionService, PoolConfig, Recorder,
    RecordingCompletionService, ThreadPoolCompletionService,
};
use thiserror::Error;

#[derive(Error, Debug)]
enum DemoError {
    #[error("Validation error: {0}")]
    ValidationError(&'static str),

    #[error("Processing error")]
    ProcessingError,
}

fn category(error: &DemoError) -> &'static str {
    match error {
        DemoError::ValidationError(_) => "validation",
        DemoError::ProcessingError => "processing",
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = PoolConfig::from_env();
    let worker_count = config.worker_count;
    let pool = ThreadPoolCompletionService::<u64, DemoError>::new(config)?;
    let service = RecordingCompletionService::with_classifier(pool, Classifier::new(category));

    println!("Worker pool started with {} workers", worker_count);

    let request_count = 100u64;
    for id in 0..request_count {
        service.submit(move || match id % 10 {
            0 => Err(DemoError::ValidationError("ID cannot be zero mod 10")),
            7 => Err(DemoError::ProcessingError),
            _ => Ok(id * 2),
        })?;
    }

    for _ in 0..request_count {
        let completion = service.take()?;
        if !completion.is_success() {
            log::debug!("Task {:?} finished as {:?}", completion.id(), completion.status());
        }
    }

    let snapshot = service.take_snapshot();
    print_snapshot_report(&snapshot);

    // Combine with counts carried over from an earlier run.
    let previous = Recorder::new();
    for _ in 0..5 {
        previous.record_success();
    }
    previous.record_error("processing");
    previous.record_uncategorized_error();

    let combined = snapshot.merge_with(&previous.take_snapshot());
    println!("Combined with previous run:\n{}", combined);

    service.into_inner().shutdown();

    Ok(())
}
