//! 에러 타입: 도메인별 에러 정의

/// Scoutpost 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum ScoutpostError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 컨테이너 엔진 에러
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// 취약점/권장사항 스캔 에러
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),

    /// 이미지 참조 검증 에러
    #[error("invalid image reference: {0}")]
    Reference(#[from] ReferenceError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 컨테이너 엔진 에러
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// 엔진 데몬 연결 실패
    #[error("connection failed: {0}")]
    Connection(String),

    /// 대상 객체를 찾을 수 없음
    #[error("not found: {0}")]
    NotFound(String),

    /// 엔진 API 호출 실패
    #[error("operation failed: {0}")]
    Operation(String),
}

/// 스캔 에러
///
/// 도구가 보고한 실패(0이 아닌 종료 코드)나 출력 파싱 실패는 에러가 아니라
/// 리포트의 `error` 필드로 표현됩니다. 여기에는 스캔 자체를 중단시키는 경우만 있습니다.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// 사전 조건 미충족 (엔진 미설치, 데몬 미실행, 확장 미설치)
    #[error("precondition unavailable: {0}")]
    Unavailable(String),

    /// 외부 명령 실행 실패
    #[error("command failed: {0}")]
    Command(String),

    /// 외부 명령 시간 초과
    #[error("command timed out: {0}")]
    Timeout(String),
}

/// 이미지 참조 검증 에러
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    /// 빈 참조
    #[error("image reference must not be empty")]
    Empty,

    /// 길이 초과
    #[error("image reference too long: {len} bytes (max: {max})")]
    TooLong { len: usize, max: usize },

    /// `-`로 시작 (명령행 플래그로 해석될 수 있음)
    #[error("image reference must not start with '-': {0}")]
    LeadingDash(String),

    /// 공백 또는 제어 문자 포함
    #[error("image reference contains invalid character {ch:?} at offset {offset}")]
    InvalidCharacter { ch: char, offset: usize },
}
