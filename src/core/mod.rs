// ─── Bundle Launcher Core ───
// Provisions application bundles and launches them.
//
// Architecture:
//   core/
//     resource/   — Artifacts, native libraries, capability traits
//     condition/  — Environment snapshot + applicability validators
//     integrity/  — Checksums, hashes, file verification
//     downloader/ — Queued, pooled downloads with cancellation
//     launch/     — Runtime probe, classpath, process spawner
//     client/     — Bundle manifest, player identity, running session
//     pipeline    — Manifest to verified local files

pub mod client;
pub mod condition;
pub mod downloader;
pub mod error;
pub mod http;
pub mod integrity;
pub mod launch;
pub mod pipeline;
pub mod preprocess;
pub mod resource;
pub mod settings;
