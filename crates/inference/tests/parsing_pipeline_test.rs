use image::{GrayImage, Rgb, RgbImage};
use inference::{
    BackendOptions, Device, ImageSource, InferenceBackend, ParsingService,
    processing::palette::LABEL_COLOURS,
};
use ndarray::{Array, ArrayD, IxDyn};
use std::cell::Cell;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use tempfile::tempdir;

/// Stand-in network predicting one side-less class everywhere, for both the
/// original and the mirrored batch entry.
struct ConstantParser {
    class: usize,
    calls: Rc<Cell<usize>>,
}

impl InferenceBackend for ConstantParser {
    fn load_model(_path: &Path, _options: &BackendOptions) -> anyhow::Result<Self> {
        Ok(Self {
            class: 5,
            calls: Rc::new(Cell::new(0)),
        })
    }

    fn infer(&mut self, input: &Array<f32, IxDyn>) -> anyhow::Result<ArrayD<f32>> {
        self.calls.set(self.calls.get() + 1);
        let shape = input.shape();
        assert_eq!(shape[0], 2, "parsing batches hold original + mirror");
        let (h, w) = (shape[2], shape[3]);

        let mut out = Array::zeros(IxDyn(&[2, 20, h, w]));
        for b in 0..2 {
            for y in 0..h {
                for x in 0..w {
                    out[[b, self.class, y, x]] = 1.0;
                }
            }
        }
        Ok(out)
    }

    fn device(&self) -> Device {
        Device::Cpu
    }
}

/// Returns a tensor of the wrong rank, as a mismatched export would.
struct BrokenParser;

impl InferenceBackend for BrokenParser {
    fn load_model(_path: &Path, _options: &BackendOptions) -> anyhow::Result<Self> {
        Ok(Self)
    }

    fn infer(&mut self, _input: &Array<f32, IxDyn>) -> anyhow::Result<ArrayD<f32>> {
        Ok(Array::zeros(IxDyn(&[1, 1000])))
    }

    fn device(&self) -> Device {
        Device::Cpu
    }
}

fn write_image(path: &Path, width: u32, height: u32) {
    RgbImage::from_fn(width, height, |x, y| Rgb([(x * 20) as u8, (y * 20) as u8, 90]))
        .save(path)
        .unwrap();
}

/// One parsed/label pair per input image, at the input resolution.
#[test]
fn test_one_artifact_pair_per_image() {
    let inputs = tempdir().unwrap();
    let outputs = tempdir().unwrap();
    write_image(&inputs.path().join("person_1.png"), 12, 8);
    write_image(&inputs.path().join("person_2.png"), 6, 10);
    fs::write(inputs.path().join("val.txt"), "person_1.png\nperson_2.png\n").unwrap();

    let backend = ConstantParser::load_model(Path::new("unused"), &BackendOptions::default()).unwrap();
    let calls = backend.calls.clone();
    let service = ParsingService::new(backend, vec![1.0, 0.5, 1.5], outputs.path()).unwrap();

    let source = ImageSource::List {
        list: inputs.path().join("val.txt"),
        data_root: inputs.path().to_path_buf(),
    };
    let summary = service.run(&source).unwrap();

    assert_eq!(summary.outputs.len(), 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(calls.get(), 2 * 3, "one forward pass per image and scale");

    let parsed = image::open(outputs.path().join("parsed_person_1.png"))
        .unwrap()
        .to_rgb8();
    assert_eq!(parsed.dimensions(), (12, 8));
    assert!(parsed.pixels().all(|p| p.0 == LABEL_COLOURS[5]));

    let label: GrayImage = image::open(outputs.path().join("label_person_2.png"))
        .unwrap()
        .to_luma8();
    assert_eq!(label.dimensions(), (6, 10));
    assert!(label.pixels().all(|p| p.0 == [5]));

    let timings = fs::read_to_string(&summary.timing_log).unwrap();
    let lines: Vec<_> = timings.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("person_1.png\t"));
    assert!(lines[0].ends_with(" ms"));
    assert_eq!(
        summary.timing_log.file_name().unwrap(),
        "time_parsing_cpu.txt"
    );
}

/// A single image path creates the output directory on demand.
#[test]
fn test_single_image_creates_output_dir() {
    let inputs = tempdir().unwrap();
    let outputs = tempdir().unwrap();
    let image_path = inputs.path().join("solo.jpg");
    write_image(&image_path, 9, 9);
    let output_dir = outputs.path().join("demo_imgs");

    let backend = ConstantParser::load_model(Path::new("unused"), &BackendOptions::default()).unwrap();
    let service = ParsingService::new(backend, vec![1.0], &output_dir).unwrap();
    let summary = service.run(&ImageSource::Single(image_path)).unwrap();

    assert_eq!(summary.outputs.len(), 1);
    assert!(output_dir.join("parsed_solo.png").is_file());
    assert!(output_dir.join("label_solo.png").is_file());
}

/// Per-image failures are counted and the run carries on.
#[test]
fn test_bad_model_output_fails_per_image() {
    let inputs = tempdir().unwrap();
    let outputs = tempdir().unwrap();
    let image_path = inputs.path().join("a.png");
    write_image(&image_path, 4, 4);

    let service = ParsingService::new(BrokenParser, vec![1.0], outputs.path()).unwrap();
    let summary = service.run(&ImageSource::Single(image_path)).unwrap();

    assert_eq!(summary.outputs.len(), 0);
    assert_eq!(summary.failed, 1);
    assert!(!outputs.path().join("parsed_a.png").exists());
}

/// A missing source aborts before any image is touched.
#[test]
fn test_missing_list_is_fatal() {
    let outputs = tempdir().unwrap();
    let service = ParsingService::new(BrokenParser, vec![1.0], outputs.path()).unwrap();
    let source = ImageSource::List {
        list: outputs.path().join("nope.txt"),
        data_root: outputs.path().to_path_buf(),
    };
    assert!(service.run(&source).is_err());
}

#[test]
fn test_invalid_scales_rejected() {
    assert!(ParsingService::new(BrokenParser, vec![], "out").is_err());
    assert!(ParsingService::new(BrokenParser, vec![-1.0], "out").is_err());
}
