use criterion::{Criterion, criterion_group, criterion_main};
use msgforge::config::{KeywordConfig, RuleConfig};
use msgforge::validator::ComplianceValidator;
use msgforge::validator::policy::PolicyAuditor;
use std::hint::black_box;

fn sample_text() -> String {
    let mut text = String::from("안녕하세요 #{고객명}님. ");
    for i in 0..12 {
        text.push_str(&format!("주문하신 #{{상품명{}}} 상품이 준비되었습니다. ", i));
    }
    text.push_str("문의가 있으시면 고객센터로 연락 바랍니다.");
    text
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let validator = ComplianceValidator::from_parts(KeywordConfig::default(), RuleConfig::default());
    let auditor = PolicyAuditor::new(KeywordConfig::default(), RuleConfig::default());
    let text = sample_text();

    c.bench_function("checklist_validation", |b| {
        b.iter(|| validator.validate(black_box(&text)))
    });
    c.bench_function("policy_audit", |b| {
        b.iter(|| auditor.audit(black_box(&text)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
