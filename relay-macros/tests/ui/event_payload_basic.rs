use relay_domain::event::Event;
use relay_macros::event_payload;

#[event_payload]
struct UploadPdf {
    uri: String,
}

#[event_payload(name = "custom.name")]
#[derive(PartialEq)]
#[serde(rename_all = "camelCase")]
struct Renamed {
    size_bytes: u64,
}

fn main() {
    assert_eq!(UploadPdf::NAME, "upload-pdf");
    assert_eq!(Renamed::NAME, "custom.name");
    assert!(!UploadPdf::definition().has_schema());

    let upload = UploadPdf { uri: "gs://a".into() };
    let _ = format!("{:?}", upload.clone());

    let json = serde_json::to_value(Renamed { size_bytes: 1 }).unwrap();
    assert_eq!(json["sizeBytes"], 1);
    assert!(Renamed { size_bytes: 1 } == Renamed { size_bytes: 1 });
}
