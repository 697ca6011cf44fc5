use crate::{
    build::{BuildResult, Builder},
    config::BuildConfig,
    log,
};

pub async fn run(config: &BuildConfig) -> Result<BuildResult, anyhow::Error> {
    // Stages are blocking child processes, keep them off the runtime threads.
    let builder = Builder::new(config.clone());
    let result = tokio::task::spawn_blocking(move || builder.build()).await??;

    log::info(&format!(
        "Compiled \"{}\" to \"{}\"",
        config.path.display(),
        result.output_dir.display()
    ));
    log::info(&format!(
        "{} document(s), {} public file(s), {} stage(s)",
        result.documents, result.static_files, result.stages
    ));

    Ok(result)
}
