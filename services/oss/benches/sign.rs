use alioss::{Client, Config, Params};
use alioss_core::Context;
use chrono::{TimeZone, Utc};
use criterion::criterion_group;
use criterion::criterion_main;
use criterion::Criterion;
use http::HeaderMap;

criterion_group!(benches, bench);
criterion_main!(benches);

pub fn bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("oss");

    let client = Client::with_context(
        Config::default().with_credential("access_key_id", "secret_access_key"),
        Context::new(),
    )
    .expect("client must be valid");
    let bucket = client.bucket("test");
    let expires = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();

    group.bench_function("signed_url", |b| {
        let mut headers = HeaderMap::new();
        for i in 1..=5 {
            headers.insert(
                format!("x-oss-meta-{i}").parse::<http::HeaderName>().unwrap(),
                "Hello, World!".parse().unwrap(),
            );
        }

        b.iter(|| {
            bucket
                .signed_url_with_args("hello", expires, Params::new(), headers.clone())
                .expect("must success")
        })
    });

    group.bench_function("upload_signed_url", |b| {
        b.iter(|| bucket.upload_signed_url("hello", "PUT", "text/plain", expires))
    });

    group.bench_function("post_form_args", |b| {
        b.iter(|| {
            bucket
                .post_form_args("hello", expires, "")
                .expect("must success")
        })
    });

    group.finish();
}
