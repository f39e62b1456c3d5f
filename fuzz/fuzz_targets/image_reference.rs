#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use scoutpost_core::types::ImageReference;

/// 퍼저용 이미지 참조 구성 요소
#[derive(Arbitrary, Debug)]
struct FuzzReference {
    registry: Option<String>,
    name: String,
    tag: Option<String>,
    digest: Option<String>,
}

impl FuzzReference {
    fn render(&self) -> String {
        let mut raw = String::new();
        if let Some(registry) = &self.registry {
            raw.push_str(registry);
            raw.push('/');
        }
        raw.push_str(&self.name);
        if let Some(tag) = &self.tag {
            raw.push(':');
            raw.push_str(tag);
        }
        if let Some(digest) = &self.digest {
            raw.push('@');
            raw.push_str(digest);
        }
        raw
    }
}

fuzz_target!(|input: FuzzReference| {
    let raw = input.render();
    let Ok(reference) = ImageReference::parse(&raw) else {
        return;
    };

    // 검증을 통과한 참조는 명령행 플래그나 공백을 포함하지 않음
    assert!(!reference.as_str().starts_with('-'));
    assert!(!reference.as_str().chars().any(char::is_whitespace));

    let (repository, tag) = reference.split_tag();
    assert!(!tag.is_empty() || raw.ends_with(':') || raw.ends_with('@'));
    assert!(raw.starts_with(repository));
});
