pub mod audio;
pub mod chat;
pub mod gemini;
pub mod prompts;
pub mod realtime;
pub mod solver;
pub mod splitter;
pub mod tts;

// Re-export commonly used types for convenience
pub use audio::{
    AudioDevice, AudioDeviceError, AudioFrame, CaptureConfig, CodecError, PlaybackSchedule,
    PlaybackSink, decode_inbound, encode_outbound,
};

pub use chat::{ChatError, ChatModels, ChatSession, ConversationTurn, Mode};

pub use gemini::{Citation, GeminiClient, GeminiClientConfig, GeminiError, GenerativeBackend};

pub use realtime::{
    GeminiLive, LiveEvent, LiveSessionConfig, LiveTransport, RealtimeAudioSession, RealtimeError,
    RealtimeResult, SessionState,
};

pub use solver::{ImageAttachment, Question, SolveError, Solver, SolverSettings};

pub use splitter::{MarkerSplitter, ResponseSplitter, SolutionDocument};

pub use tts::{GeminiTTS, PlaybackOutcome, SpeechPlayer, SpeechSynthesizer, TTSError, TTSResult};
