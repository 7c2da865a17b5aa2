#![no_main]
use compact_binary::{collect_attachments, Field};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(field) = Field::new(data) else {
        return;
    };
    let _ = collect_attachments(&field);
    let _ = format!("{:?}", field);
    let copy = field.to_vec();
    let reparsed = Field::new(&copy).expect("canonical copy must parse");
    assert_eq!(reparsed, field);
    assert_eq!(reparsed.hash(), field.hash());
});
