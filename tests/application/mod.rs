mod audio_resource_test;
mod transcription_worker_test;
mod worker_supervisor_test;
