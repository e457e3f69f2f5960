use chatwire_core::{ChatResult, CompletionFragment, FragmentDecoder};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use serde_json::json;

fn make_stream(events: usize, chunked: bool) -> Vec<u8> {
    let mut body = String::new();
    for i in 0..events {
        let payload = json!({
            "id": "chatcmpl-bench",
            "object": "chat.completion.chunk",
            "choices": [{"index": 0, "delta": {"content": format!("token {i} ")}, "finish_reason": null}]
        });
        let event = format!("data: {payload}\n\n");
        if chunked {
            body.push_str(&format!("{:x}\r\n{}\r\n", event.len(), event));
        } else {
            body.push_str(&event);
        }
    }

    let mut wire = String::from("HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\n");
    if chunked {
        wire.push_str("Transfer-Encoding: chunked\r\n\r\n");
        body.push_str("e\r\ndata: [DONE]\n\n\r\n0\r\n\r\n");
    } else {
        wire.push_str("\r\n");
        body.push_str("data: [DONE]\n\n");
    }
    wire.push_str(&body);
    wire.into_bytes()
}

fn decode(wire: &[u8], read_size: usize) -> usize {
    let mut decoder = FragmentDecoder::new();
    let mut chars = 0;
    let mut on_fragment = |fragment: CompletionFragment| -> ChatResult<()> {
        chars += fragment.text()?.len();
        Ok(())
    };
    for piece in wire.chunks(read_size) {
        if decoder
            .feed(piece, &mut on_fragment)
            .map(|state| state.is_terminal())
            .unwrap_or(true)
        {
            break;
        }
    }
    chars
}

fn bench_decoder(c: &mut Criterion) {
    let mut group = c.benchmark_group("fragment_decoder");
    for chunked in [false, true] {
        let wire = make_stream(1000, chunked);
        group.throughput(Throughput::Bytes(wire.len() as u64));
        for read_size in [64, 4096] {
            let name = format!(
                "{}_reads_of_{read_size}",
                if chunked { "chunked" } else { "plain" }
            );
            group.bench_function(name, |b| b.iter(|| decode(black_box(&wire), read_size)));
        }
    }
    group.finish();
}

criterion_group!(benches, bench_decoder);
criterion_main!(benches);
