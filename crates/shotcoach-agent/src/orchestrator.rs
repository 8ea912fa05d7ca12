//! Guidance orchestration.
//!
//! `GuidanceAgent` owns every piece of mutable state (result cache, session)
//! and composes frame analysis, arbitration and advice validation into the
//! single `get_guidance` entry point used by transport layers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinError;
use tracing::{debug, Instrument};

use shotcoach_advisor::metrics::record_call;
use shotcoach_advisor::{advise_with_retry, with_deadline, AdviceCall, AdviceRequest, Advisor, CallPlan};
use shotcoach_models::{
    AnalysisSummary, GuidanceResponse, HistoryMessage, HistorySummary, ImageMetrics, Role, Suggestion,
    TiltEstimate,
};
use shotcoach_vision::{prepare_upload, FrameAnalyzer, UploadLimits};

use crate::arbitration::{decide, GuidanceSource};
use crate::cache::{fingerprint, ResultCache, SourceStamp};
use crate::config::AgentConfig;
use crate::error::{AgentError, AgentResult};
use crate::knowledge::KnowledgeBase;
use crate::logging::GuidanceLogger;
use crate::metrics;
use crate::prompts::{advice_prompt, intent_system_message, level_check_prompt};
use crate::session::SessionState;
use crate::validator::{interpret, AdviceSource, ValidatedAdvice};

/// Where a frame comes from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        ImageSource::Bytes(bytes)
    }
}

/// The guidance decision engine.
pub struct GuidanceAgent {
    analyzer: FrameAnalyzer,
    advisor: Arc<dyn Advisor>,
    cache: ResultCache,
    session: Mutex<SessionState>,
    knowledge: KnowledgeBase,
    upload: UploadLimits,
    calls: CallPlan,
}

impl GuidanceAgent {
    /// Build an agent, loading the cache and knowledge files when configured.
    pub fn new(config: AgentConfig, advisor: Arc<dyn Advisor>) -> Self {
        let cache = match &config.cache_file {
            Some(path) => ResultCache::open(path, config.cache_ttl, config.cache_capacity),
            None => ResultCache::new(config.cache_ttl, config.cache_capacity),
        };
        let knowledge = config
            .knowledge_file
            .as_deref()
            .map(KnowledgeBase::load)
            .unwrap_or_default();

        Self {
            analyzer: FrameAnalyzer::new(config.detector),
            advisor,
            cache,
            session: Mutex::new(SessionState::new(config.history_limit)),
            knowledge,
            upload: config.upload,
            calls: config.calls,
        }
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    // ========================================================================
    // Session operations
    // ========================================================================

    pub async fn start_session(&self) -> String {
        self.session.lock().await.start()
    }

    pub async fn set_intent(&self, intent: &str) -> AgentResult<String> {
        let confirmation = self.session.lock().await.set_intent(intent)?;
        debug!(intent = %intent.trim(), "Shooting intent captured");
        Ok(confirmation)
    }

    pub async fn clear_history(&self) {
        self.session.lock().await.clear();
    }

    pub async fn history_summary(&self) -> HistorySummary {
        self.session.lock().await.summary()
    }

    pub async fn intent(&self) -> Option<String> {
        self.session.lock().await.intent().map(str::to_string)
    }

    // ========================================================================
    // Guidance
    // ========================================================================

    /// Analyse one frame and return up to five ordered suggestions.
    ///
    /// Only unreadable input produces an error envelope; advisor and cache
    /// failures degrade to fallback suggestions.
    pub async fn get_guidance(&self, source: impl Into<ImageSource>) -> GuidanceResponse {
        let logger = GuidanceLogger::new("get_guidance");
        let span = logger.create_span();
        let source = source.into();

        async {
            logger.log_start(&describe(&source));
            match self.guide(source, &logger).await {
                Ok(response) => {
                    logger.log_completion(&format!("{} suggestions", response.suggestions.len()));
                    response
                }
                Err(e) => {
                    if e.is_input_error() {
                        logger.log_warning(&format!("Rejected frame: {}", e));
                    } else {
                        logger.log_error(&e.to_string());
                    }
                    GuidanceResponse::failed(e.to_string())
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn guide(&self, source: ImageSource, logger: &GuidanceLogger) -> AgentResult<GuidanceResponse> {
        let (bytes, stamp) = read_source(source).await?;

        let analyzer = self.analyzer.clone();
        let frame = Arc::new(bytes);
        let decode_input = Arc::clone(&frame);
        let (gray, metrics) = tokio::task::spawn_blocking(move || analyzer.prepare(&decode_input))
            .await
            .map_err(|e| AgentError::invalid_input(format!("Frame decoding aborted: {}", e)))??;

        let analyzer = self.analyzer.clone();
        let tilt = detected_tilt(tokio::task::spawn_blocking(move || analyzer.detect(&gray)).await, logger);

        logger.log_progress(&format!(
            "{}x{} brightness {:.1} ({}), tilt {:.1}° {} (confidence {:.2})",
            metrics.width,
            metrics.height,
            metrics.brightness,
            metrics.brightness_tier,
            tilt.tilt_angle,
            tilt.tilt_direction,
            tilt.confidence
        ));

        let upload = prepare_upload(&frame, &self.upload);
        let (intent, history, generation) = {
            let session = self.session.lock().await;
            (session.intent().map(str::to_string), session.history(), session.generation())
        };

        let request = FrameRequest {
            agent: self,
            logger,
            metrics,
            tilt,
            stamp,
            upload,
            intent,
            history,
            generation,
        };
        let decision = decide(&tilt, &request).await;

        let analysis = AnalysisSummary {
            is_level: decision.is_level,
            tilt_angle: tilt.tilt_angle,
            brightness_tier: metrics.brightness_tier,
            tilt_direction: decision.tilt_direction,
            level_source: decision.level_source,
        };
        Ok(GuidanceResponse::ok(decision.suggestions, analysis))
    }
}

/// The frame is readable by now, so a detector fault only costs the tilt.
fn detected_tilt(joined: Result<TiltEstimate, JoinError>, logger: &GuidanceLogger) -> TiltEstimate {
    match joined {
        Ok(tilt) => tilt,
        Err(e) => {
            logger.log_warning(&format!("Horizon detection aborted, treating frame as level: {}", e));
            TiltEstimate::degraded()
        }
    }
}

fn describe(source: &ImageSource) -> String {
    match source {
        ImageSource::Path(path) => format!("frame {}", path.display()),
        ImageSource::Bytes(bytes) => format!("uploaded frame ({} bytes)", bytes.len()),
    }
}

async fn read_source(source: ImageSource) -> AgentResult<(Vec<u8>, SourceStamp)> {
    match source {
        ImageSource::Path(path) => {
            let bytes = tokio::fs::read(&path).await.map_err(|e| {
                AgentError::invalid_input(format!("Cannot read image {}: {}", path.display(), e))
            })?;
            let stamp = SourceStamp::from_path(&path).unwrap_or_else(|_| SourceStamp::from_bytes(&bytes));
            Ok((bytes, stamp))
        }
        ImageSource::Bytes(bytes) => {
            if bytes.is_empty() {
                return Err(AgentError::invalid_input("Image payload is empty"));
            }
            let stamp = SourceStamp::from_bytes(&bytes);
            Ok((bytes, stamp))
        }
    }
}

/// Per-frame view of the agent handed to arbitration.
struct FrameRequest<'a> {
    agent: &'a GuidanceAgent,
    logger: &'a GuidanceLogger,
    metrics: ImageMetrics,
    tilt: TiltEstimate,
    stamp: SourceStamp,
    upload: Vec<u8>,
    intent: Option<String>,
    history: Vec<HistoryMessage>,
    /// Session generation the intent and history were read under.
    generation: u64,
}

impl<'a> FrameRequest<'a> {
    async fn fetch_advice(&self, count: usize) -> ValidatedAdvice {
        let agent = self.agent;
        let prompt = advice_prompt(
            &self.metrics,
            self.intent.as_deref(),
            &agent.knowledge.advice_tips(),
            count,
        );

        let mut request = AdviceRequest::new(prompt.clone(), self.upload.clone(), agent.calls.advice)
            .with_history(self.history.clone());
        if let Some(intent) = &self.intent {
            request = request.with_system(intent_system_message(intent, count));
        }

        match advise_with_retry(agent.advisor.as_ref(), request, &agent.calls.retry).await {
            Ok(text) => {
                {
                    let mut session = agent.session.lock().await;
                    if session.generation() == self.generation {
                        session.append(Role::User, prompt, true);
                        session.append(Role::Assistant, text.as_str(), false);
                    } else {
                        debug!("Session cleared during the advice call, exchange not recorded");
                    }
                }
                interpret(&text, self.metrics.brightness_tier)
            }
            Err(e) => {
                self.logger.log_warning(&format!("Advisor unavailable, using fallback suggestions: {}", e));
                ValidatedAdvice::unavailable(self.metrics.brightness_tier)
            }
        }
    }
}

#[async_trait]
impl<'a> GuidanceSource for FrameRequest<'a> {
    async fn level_verdict(&self) -> Option<String> {
        let agent = self.agent;
        let prompt = level_check_prompt(&self.metrics, &agent.knowledge.level_tips());
        let request = AdviceRequest::new(prompt, self.upload.clone(), agent.calls.level_check);

        let started = Instant::now();
        match with_deadline(request.timeout, agent.advisor.advise_level_only(&request)).await {
            Ok(reply) => {
                record_call(AdviceCall::LevelCheck, "ok", started.elapsed());
                debug!(reply = %reply.trim(), "Level check reply");
                Some(reply)
            }
            Err(e) => {
                record_call(AdviceCall::LevelCheck, e.kind().as_str(), started.elapsed());
                self.logger.log_warning(&format!("Level check failed: {}", e));
                None
            }
        }
    }

    async fn suggestions(&self, count: usize) -> Vec<Suggestion> {
        let key = fingerprint(&self.stamp, &self.metrics, &self.tilt, count, self.intent.as_deref());
        if let Some(cached) = self.agent.cache.get(&key).await {
            self.logger.log_progress("Serving cached suggestions");
            return cached;
        }

        let advice = self.fetch_advice(count).await;
        match advice.source {
            AdviceSource::Structured | AdviceSource::Heuristic => {}
            other => metrics::record_fallback(other.as_str()),
        }
        if advice.source.is_cacheable() {
            self.agent.cache.put(&key, advice.suggestions.clone()).await;
        }

        self.logger.log_progress(&format!(
            "{} advisor suggestions ({})",
            advice.suggestions.len(),
            advice.source.as_str()
        ));
        advice.suggestions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shotcoach_advisor::{AdvisorError, AdvisorResult, RetryPolicy};
    use shotcoach_models::Direction;
    use std::sync::Mutex as StdMutex;

    /// Counts calls and answers with fixed texts.
    struct Canned {
        advice: AdvisorResult<String>,
        level: AdvisorResult<String>,
        advice_calls: StdMutex<Vec<AdviceRequest>>,
    }

    impl Canned {
        fn new(advice: AdvisorResult<String>, level: AdvisorResult<String>) -> Arc<Self> {
            Arc::new(Self {
                advice,
                level,
                advice_calls: StdMutex::new(Vec::new()),
            })
        }
    }

    fn clone_result(result: &AdvisorResult<String>) -> AdvisorResult<String> {
        match result {
            Ok(text) => Ok(text.clone()),
            Err(e) => Err(AdvisorError::network(e.to_string())),
        }
    }

    #[async_trait]
    impl Advisor for Canned {
        async fn advise(&self, request: &AdviceRequest) -> AdvisorResult<String> {
            self.advice_calls.lock().unwrap().push(request.clone());
            clone_result(&self.advice)
        }

        async fn advise_level_only(&self, _request: &AdviceRequest) -> AdvisorResult<String> {
            clone_result(&self.level)
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    const FIVE: &str = r#"{"suggestions":[
        {"step":1,"action":"Walk 2 steps left","direction":"left","intensity":3,"reason":"a"},
        {"step":2,"action":"Crouch a little","direction":"down","intensity":2,"reason":"b"},
        {"step":3,"action":"Zoom in","direction":"up","intensity":1,"reason":"c"},
        {"step":4,"action":"Step right","direction":"right","intensity":2,"reason":"d"},
        {"step":5,"action":"Raise the phone","direction":"up","intensity":2,"reason":"e"}
    ]}"#;

    fn png(width: u32, height: u32, value: u8) -> Vec<u8> {
        let image = image::DynamicImage::ImageLuma8(image::GrayImage::from_pixel(width, height, image::Luma([value])));
        let mut buffer = std::io::Cursor::new(Vec::new());
        image.write_to(&mut buffer, image::ImageOutputFormat::Png).unwrap();
        buffer.into_inner()
    }

    fn agent(advisor: Arc<Canned>) -> GuidanceAgent {
        let mut config = AgentConfig::ephemeral();
        config.calls.retry = RetryPolicy::none();
        GuidanceAgent::new(config, advisor)
    }

    #[tokio::test]
    async fn test_unreadable_input_is_an_error_envelope() {
        let agent = agent(Canned::new(Ok(FIVE.to_string()), Ok("level".to_string())));

        let garbage = agent.get_guidance(b"not an image".to_vec()).await;
        assert!(garbage.is_error());
        assert!(garbage.suggestions.is_empty());
        assert!(garbage.analysis.is_none());

        let missing = agent.get_guidance(PathBuf::from("/nonexistent/frame.jpg")).await;
        assert!(missing.is_error());

        let empty = agent.get_guidance(Vec::<u8>::new()).await;
        assert!(empty.is_error());
    }

    #[tokio::test]
    async fn test_level_frame_with_confirming_check() {
        let advisor = Canned::new(Ok(FIVE.to_string()), Ok("level".to_string()));
        let agent = agent(advisor.clone());

        let response = agent.get_guidance(png(64, 48, 200)).await;
        assert!(!response.is_error());
        assert_eq!(response.suggestions.len(), 5);
        assert_eq!(response.suggestions[0].direction, Direction::Left);

        let analysis = response.analysis.unwrap();
        assert!(analysis.is_level);
        assert_eq!(analysis.brightness_tier, shotcoach_models::BrightnessTier::Bright);

        // Exchange recorded after the reply.
        let summary = agent.history_summary().await;
        assert_eq!(summary.total_messages, 2);
        assert!(summary.messages_preview[0].has_image);
    }

    #[tokio::test]
    async fn test_second_request_is_served_from_cache() {
        let advisor = Canned::new(Ok(FIVE.to_string()), Ok("level".to_string()));
        let agent = agent(advisor.clone());
        let frame = png(64, 48, 200);

        let first = agent.get_guidance(frame.clone()).await;
        let second = agent.get_guidance(frame).await;
        assert_eq!(first.suggestions, second.suggestions);
        assert_eq!(advisor.advice_calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_advice_is_not_cached() {
        let advisor = Canned::new(Err(AdvisorError::network("down")), Ok("level".to_string()));
        let agent = agent(advisor.clone());
        let frame = png(64, 48, 20);

        let response = agent.get_guidance(frame.clone()).await;
        assert_eq!(response.suggestions.len(), 4);
        assert_eq!(response.suggestions[3].action, "Move somewhere brighter");
        assert!(agent.cache().is_empty().await);

        agent.get_guidance(frame).await;
        assert_eq!(advisor.advice_calls.lock().unwrap().len(), 2);
        // No exchange is recorded for a failed call.
        assert_eq!(agent.history_summary().await.total_messages, 0);
    }

    #[tokio::test]
    async fn test_intent_scopes_the_request() {
        let advisor = Canned::new(Ok(FIVE.to_string()), Ok("level".to_string()));
        let agent = agent(advisor.clone());

        agent.set_intent("  food  ").await.unwrap();
        assert_eq!(agent.intent().await.as_deref(), Some("food"));
        agent.get_guidance(png(64, 48, 200)).await;

        let calls = advisor.advice_calls.lock().unwrap();
        let request = &calls[0];
        assert!(request.system.as_deref().unwrap().contains("shooting food"));
        assert_eq!(request.history.len(), 2);
        assert!(request.prompt.contains("The user wants to shoot: food"));
    }

    #[tokio::test]
    async fn test_detector_panic_degrades_tilt() {
        let joined = tokio::task::spawn_blocking(|| -> TiltEstimate { panic!("detector fault") }).await;
        assert!(joined.is_err());

        let tilt = detected_tilt(joined, &GuidanceLogger::new("get_guidance"));
        assert_eq!(tilt, TiltEstimate::degraded());

        let ok = detected_tilt(Ok(TiltEstimate::no_lines()), &GuidanceLogger::new("get_guidance"));
        assert_eq!(ok, TiltEstimate::no_lines());
    }

    /// Holds the advice reply until released.
    struct Gated {
        entered: tokio::sync::Notify,
        release: tokio::sync::Notify,
    }

    #[async_trait]
    impl Advisor for Gated {
        async fn advise(&self, _request: &AdviceRequest) -> AdvisorResult<String> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(FIVE.to_string())
        }

        async fn advise_level_only(&self, _request: &AdviceRequest) -> AdvisorResult<String> {
            Ok("level".to_string())
        }

        fn name(&self) -> &str {
            "gated"
        }
    }

    #[tokio::test]
    async fn test_clear_during_advice_call_stays_cleared() {
        let advisor = Arc::new(Gated {
            entered: tokio::sync::Notify::new(),
            release: tokio::sync::Notify::new(),
        });
        let mut config = AgentConfig::ephemeral();
        config.calls.retry = RetryPolicy::none();
        let agent = GuidanceAgent::new(config, advisor.clone());
        agent.set_intent("food").await.unwrap();

        let (response, _) = tokio::join!(agent.get_guidance(png(64, 48, 200)), async {
            advisor.entered.notified().await;
            agent.clear_history().await;
            advisor.release.notify_one();
        });

        assert_eq!(response.suggestions.len(), 5);
        assert!(agent.intent().await.is_none());
        assert_eq!(agent.history_summary().await.total_messages, 0);

        // The next exchange is recorded normally.
        advisor.release.notify_one();
        agent.get_guidance(png(64, 48, 120)).await;
        assert_eq!(agent.history_summary().await.total_messages, 2);
    }

    #[tokio::test]
    async fn test_session_operations() {
        let agent = agent(Canned::new(Ok(FIVE.to_string()), Ok("level".to_string())));

        let greeting = agent.start_session().await;
        assert_eq!(greeting, crate::session::GREETING);
        assert_eq!(agent.start_session().await, crate::session::ALREADY_STARTED);
        assert!(agent.set_intent("   ").await.is_err());

        agent.set_intent("sunsets").await.unwrap();
        assert_eq!(agent.history_summary().await.total_messages, 3);

        agent.clear_history().await;
        assert!(agent.intent().await.is_none());
        assert_eq!(agent.history_summary().await.total_messages, 0);
    }
}
