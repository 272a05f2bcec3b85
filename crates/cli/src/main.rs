use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use linguaio_core::config::{
    request_timeout, resolve_api_keys, AppConfig, Env, LanguageCode, StdEnv, API_KEY_SENTINEL,
    DEFAULT_ESPEAK_BINARY, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SOURCE_LANG, DEFAULT_TARGET_LANG,
    ENV_ENGINE, ENV_ESPEAK_BINARY, ENV_REQUEST_TIMEOUT_SECS, ENV_SOURCE_LANG, ENV_SPEECH_RATE,
    ENV_TARGET_LANG, ENV_TONE, ENV_VOICE, STORAGE_GEMINI_KEY, STORAGE_OPENAI_KEY,
};
use linguaio_core::grammar::{GrammarReport, GrammarService};
use linguaio_core::http::build_client;
use linguaio_core::lang::{
    language_name, speech_locale, tone_description, Engine, SpeechRate, Tone, VoiceEngine,
};
use linguaio_core::pipeline::Pipeline;
use linguaio_core::session::{Field, Session, Update};
use linguaio_core::settings::{save_api_keys, settings_path, FileKeyStore, KeyStore};
use linguaio_core::shadowing::{
    seeded_rng, waveform_frame, AccuracyBand, Recording, ShadowingPanel, SimulatedScorer,
    WAVE_MAX_HEIGHT,
};
use linguaio_core::speech::{synthesizer_for, SpeechAudio, SpeechRequest};
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

const WAVEFORM_BARS: usize = 40;

#[derive(Parser, Debug)]
#[command(name = "linguaio")]
#[command(about = "Translate, analyze grammar and practice pronunciation")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Settings file holding saved API keys.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[arg(long, global = true)]
    openai_key: Option<String>,

    #[arg(long, global = true)]
    gemini_key: Option<String>,

    #[arg(
        long,
        global = true,
        env = ENV_REQUEST_TIMEOUT_SECS,
        default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS
    )]
    timeout_secs: u64,

    #[arg(long, global = true, env = ENV_SOURCE_LANG, default_value = DEFAULT_SOURCE_LANG)]
    from: String,

    #[arg(long, global = true, env = ENV_TARGET_LANG, default_value = DEFAULT_TARGET_LANG)]
    to: String,

    /// google, openai or gemini.
    #[arg(long, global = true, env = ENV_ENGINE, default_value = "google")]
    engine: String,

    #[arg(long, global = true, env = ENV_TONE, default_value = "neutral")]
    tone: String,

    /// Voice for speak: system or openai.
    #[arg(long, global = true, env = ENV_VOICE, default_value = "system")]
    voice: String,

    /// normal, slow or very-slow.
    #[arg(long, global = true, env = ENV_SPEECH_RATE, default_value = "normal")]
    speed: String,

    /// Executable used by the system voice.
    #[arg(long, global = true, env = ENV_ESPEAK_BINARY, default_value = DEFAULT_ESPEAK_BINARY)]
    espeak_binary: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Translate text, then break down the grammar of the result.
    Translate {
        text: String,
        #[arg(long)]
        no_grammar: bool,
    },
    /// Grammar analysis of a text.
    Grammar {
        text: String,
        /// Defaults to the target language.
        #[arg(long)]
        lang: Option<String>,
    },
    /// Rewrite an existing translation in the tone given by --tone.
    Tone {
        source: String,
        #[arg(long)]
        translation: String,
    },
    /// Read text aloud, or write the audio to a file.
    Speak {
        text: String,
        /// Defaults to the target language.
        #[arg(long)]
        lang: Option<String>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Score a recorded attempt at saying a text.
    Shadow {
        #[arg(long)]
        text: String,
        #[arg(long)]
        recording: PathBuf,
        /// Seed for a reproducible score.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Manage saved API keys.
    Keys {
        #[command(subcommand)]
        action: KeysAction,
    },
}

#[derive(Subcommand, Debug)]
enum KeysAction {
    /// Save keys. Blank values leave the stored key unchanged.
    Save {
        #[arg(long)]
        openai: Option<String>,
        #[arg(long)]
        gemini: Option<String>,
    },
    /// Show which keys are configured, never their values.
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.global.log_level)?;

    let env = StdEnv;
    let path = settings_path(cli.global.settings.clone(), &env)?;
    let mut store = FileKeyStore::open(&path)?;
    let cfg = build_config(&cli.global, &env, &store)?;

    tracing::debug!(
        settings = %store.path().display(),
        timeout_secs = cfg.request_timeout.as_secs(),
        openai_key = cfg.api_keys.openai.is_some(),
        gemini_key = cfg.api_keys.gemini.is_some(),
        "config loaded"
    );

    match cli.command {
        Command::Translate { text, no_grammar } => {
            let session = Session::from_config(&cfg).with_source_text(text);
            run_translate(&cfg, session, !no_grammar).await
        }
        Command::Grammar { text, lang } => {
            let lang = lang_or_target(lang.as_deref(), &cfg)?;
            let service = GrammarService::new(
                build_client(cfg.request_timeout)?,
                cfg.endpoints.clone(),
            );
            let report = service.analyze(&text, &lang, cfg.engine, &cfg.api_keys).await;
            print_report(&report);
            Ok(())
        }
        Command::Tone { source, translation } => {
            let mut session = Session::from_config(&cfg).with_source_text(source);
            let token = session.begin(Field::Translation);
            session.commit_translation(token, translation);
            run_tone(&cfg, session).await
        }
        Command::Speak { text, lang, output } => {
            let request = SpeechRequest::new(text, lang_or_target(lang.as_deref(), &cfg)?)
                .with_rate(cfg.speech_rate);
            run_speak(&cfg, request, output).await
        }
        Command::Shadow {
            text,
            recording,
            seed,
        } => run_shadow(&text, recording, seed),
        Command::Keys { action } => match action {
            KeysAction::Save { openai, gemini } => {
                let saved = save_api_keys(&mut store, openai.as_deref(), gemini.as_deref())?;
                if saved.is_empty() {
                    println!("Nothing to save.");
                } else {
                    println!("Saved {} to {}", saved.join(", "), store.path().display());
                }
                Ok(())
            }
            KeysAction::Show => {
                show_keys(&cfg, &store);
                Ok(())
            }
        },
    }
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn build_config(
    args: &GlobalArgs,
    env: &impl Env,
    store: &dyn KeyStore,
) -> anyhow::Result<AppConfig> {
    let api_keys = resolve_api_keys(args.openai_key.clone(), args.gemini_key.clone(), env, store);
    let voice = VoiceEngine::parse(&args.voice)
        .with_context(|| format!("unknown voice {:?}; use system or openai", args.voice))?;
    let cfg = AppConfig {
        source_lang: LanguageCode::new(args.from.as_str())?,
        target_lang: LanguageCode::new(args.to.as_str())?,
        engine: parse_engine(&args.engine),
        tone: parse_tone(&args.tone),
        voice,
        speech_rate: SpeechRate::parse_label(&args.speed),
        espeak_binary: args.espeak_binary.clone(),
        api_keys,
        request_timeout: request_timeout(args.timeout_secs)?,
        ..AppConfig::default()
    };
    cfg.endpoints.validate()?;
    Ok(cfg)
}

fn lang_or_target(code: Option<&str>, cfg: &AppConfig) -> anyhow::Result<String> {
    match code {
        Some(code) => Ok(LanguageCode::new(code)?.as_str().to_owned()),
        None => Ok(cfg.target_lang.as_str().to_owned()),
    }
}

fn parse_engine(id: &str) -> Engine {
    let engine = Engine::from_id(id);
    if Engine::parse(id).is_none() {
        tracing::warn!(requested = id, using = %engine, "unknown engine");
    }
    engine
}

fn parse_tone(label: &str) -> Tone {
    let tone = Tone::parse_label(label).unwrap_or_else(|| {
        tracing::warn!(requested = label, "unknown tone; using neutral");
        Tone::Neutral
    });
    tracing::debug!(tone = %tone, style = tone_description(label), "tone selected");
    tone
}

async fn run_translate(
    cfg: &AppConfig,
    session: Session,
    with_grammar: bool,
) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(
        build_client(cfg.request_timeout)?,
        cfg.endpoints.clone(),
        cfg.api_keys.clone(),
    );
    let session = Mutex::new(session);

    if with_grammar {
        let (translation, report) = pipeline.translate_and_analyze(&session).await?;
        if let Update::Applied(t) = translation {
            println!("{}", t.text);
        }
        if let Some(report) = report {
            println!();
            print_report(&report);
        }
    } else if let Update::Applied(t) = pipeline.translate(&session).await? {
        println!("{}", t.text);
    }
    Ok(())
}

async fn run_tone(cfg: &AppConfig, session: Session) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(
        build_client(cfg.request_timeout)?,
        cfg.endpoints.clone(),
        cfg.api_keys.clone(),
    );
    let session = Mutex::new(session);

    if let Update::Applied(t) = pipeline.apply_tone(&session).await? {
        println!("{}", t.text);
    }
    if let Update::Applied(report) = pipeline.analyze(&session).await {
        println!();
        print_report(&report);
    }
    Ok(())
}

async fn run_speak(
    cfg: &AppConfig,
    request: SpeechRequest,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let client = build_client(cfg.request_timeout)?;
    let synthesizer = synthesizer_for(cfg, &client)?;

    tracing::info!(
        lang = %language_name(&request.lang),
        locale = speech_locale(&request.lang),
        rate = request.rate.factor(),
        "synthesizing speech"
    );
    let audio = synthesizer.synthesize(request).await?;

    match output {
        Some(path) => {
            std::fs::write(&path, &audio.data)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!(
                "Wrote {} bytes of {} audio to {}",
                audio.data.len(),
                audio.format.extension(),
                path.display()
            );
            Ok(())
        }
        None => play(audio).await,
    }
}

#[cfg(feature = "playback")]
async fn play(audio: SpeechAudio) -> anyhow::Result<()> {
    use linguaio_core::playback::{PlaybackSink, RodioPlaybackSink};

    RodioPlaybackSink::new().play(audio).await?;
    Ok(())
}

#[cfg(not(feature = "playback"))]
async fn play(_audio: SpeechAudio) -> anyhow::Result<()> {
    anyhow::bail!("built without audio playback; pass --output to save the audio instead")
}

fn run_shadow(text: &str, recording: PathBuf, seed: Option<u64>) -> anyhow::Result<()> {
    let data = std::fs::read(&recording)
        .with_context(|| format!("failed to read recording {}", recording.display()))?;

    let mut panel = ShadowingPanel::new(SimulatedScorer::new(seeded_rng(seed)));
    panel.start()?;
    let accuracy = panel.stop(text, Recording::wav(data))?;

    let mut rng = seeded_rng(seed.map(|s| s.wrapping_add(1)));
    println!("{}", render_waveform(&waveform_frame(&mut rng, WAVEFORM_BARS)));
    let band = match accuracy.band() {
        AccuracyBand::Good => "good",
        AccuracyBand::Fair => "fair",
        AccuracyBand::Poor => "needs work",
    };
    println!("Accuracy: {accuracy} ({band})");
    Ok(())
}

fn render_waveform(heights: &[f32]) -> String {
    const LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
    heights
        .iter()
        .map(|h| {
            let idx = ((h / WAVE_MAX_HEIGHT) * LEVELS.len() as f32) as usize;
            LEVELS[idx.min(LEVELS.len() - 1)]
        })
        .collect()
}

fn show_keys(cfg: &AppConfig, store: &FileKeyStore) {
    println!("Settings: {}", store.path().display());
    for (label, key, storage_key) in [
        ("OpenAI", cfg.api_keys.openai.is_some(), STORAGE_OPENAI_KEY),
        ("Google Gemini", cfg.api_keys.gemini.is_some(), STORAGE_GEMINI_KEY),
    ] {
        let saved = store.get(storage_key).is_some();
        match (key, saved) {
            (true, true) => println!("  {label}: {API_KEY_SENTINEL} (saved)"),
            (true, false) => println!("  {label}: {API_KEY_SENTINEL} (from flag or environment)"),
            (false, _) => println!("  {label}: not configured"),
        }
    }
}

fn print_report(report: &GrammarReport) {
    println!("Grammar ({}):", report.source);
    for finding in &report.findings {
        println!("  {}: {}", finding.name, finding.explanation);
        for example in finding.examples() {
            println!("    - {example}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use linguaio_core::config::{MapEnv, ENV_OPENAI_API_KEY};
    use linguaio_core::settings::MemoryKeyStore;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_work_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "linguaio",
            "translate",
            "Olá",
            "--engine",
            "openai",
            "--openai-key",
            "sk-cli",
        ])
        .expect("parse");
        assert_eq!(cli.global.openai_key.as_deref(), Some("sk-cli"));
        assert_eq!(cli.global.engine, "openai");
        assert!(matches!(cli.command, Command::Translate { ref text, .. } if text == "Olá"));
    }

    #[test]
    fn config_carries_languages_engine_tone_and_voice() {
        let cli = Cli::try_parse_from([
            "linguaio",
            "speak",
            "Bonjour",
            "--from",
            "ES",
            "--to",
            "fr",
            "--engine",
            "gemini",
            "--tone",
            "Profissional",
            "--voice",
            "openai",
            "--speed",
            "very-slow",
            "--espeak-binary",
            "/opt/espeak/bin/espeak-ng",
        ])
        .expect("parse");
        let cfg = build_config(&cli.global, &MapEnv::default(), &MemoryKeyStore::default())
            .expect("config");

        assert_eq!(cfg.source_lang.as_str(), "es");
        assert_eq!(cfg.target_lang.as_str(), "fr");
        assert_eq!(cfg.engine, Engine::Gemini);
        assert_eq!(cfg.tone, Tone::Professional);
        assert_eq!(cfg.voice, VoiceEngine::OpenAi);
        assert_eq!(cfg.speech_rate, SpeechRate::VerySlow);
        assert_eq!(cfg.espeak_binary, PathBuf::from("/opt/espeak/bin/espeak-ng"));

        let session = Session::from_config(&cfg).with_source_text("Hola");
        assert_eq!(session.source_lang, "es");
        assert_eq!(session.target_lang, "fr");
        assert_eq!(session.engine, Engine::Gemini);
        assert_eq!(session.tone, Tone::Professional);
        assert_eq!(lang_or_target(None, &cfg).expect("target"), "fr");
        assert_eq!(lang_or_target(Some(" DE "), &cfg).expect("given"), "de");
    }

    #[test]
    fn unknown_voice_is_rejected() {
        let cli = Cli::try_parse_from(["linguaio", "--voice", "piper", "keys", "show"])
            .expect("parse");
        let err = build_config(&cli.global, &MapEnv::default(), &MemoryKeyStore::default())
            .expect_err("unknown voice");
        assert!(err.to_string().contains("piper"), "{err}");
    }

    #[test]
    fn config_layers_keys_and_timeout() {
        let cli = Cli::try_parse_from(["linguaio", "--timeout-secs", "5", "keys", "show"])
            .expect("parse");
        let env = MapEnv::default().with_var(ENV_OPENAI_API_KEY, API_KEY_SENTINEL);
        let store = MemoryKeyStore::default().with_entry(STORAGE_GEMINI_KEY, "saved-gemini");

        let cfg = build_config(&cli.global, &env, &store).expect("config");
        assert!(cfg.api_keys.openai.is_none());
        assert_eq!(
            cfg.api_keys.gemini.as_ref().map(|k| k.expose()),
            Some("saved-gemini")
        );
        assert_eq!(cfg.request_timeout.as_secs(), 5);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let cli = Cli::try_parse_from(["linguaio", "--timeout-secs", "0", "keys", "show"])
            .expect("parse");
        assert!(build_config(&cli.global, &MapEnv::default(), &MemoryKeyStore::default()).is_err());
    }

    #[test]
    fn unknown_engine_and_tone_fall_back() {
        assert_eq!(parse_engine("deepl"), Engine::Google);
        assert_eq!(parse_tone("sarcastic"), Tone::Neutral);
        assert_eq!(parse_tone("Formal"), Tone::Formal);
    }

    #[test]
    fn waveform_renders_one_glyph_per_bar() {
        let rendered = render_waveform(&[10.0, 45.0, 79.9]);
        assert_eq!(rendered.chars().count(), 3);
        assert!(rendered.ends_with('█'));
    }
}
