use crate::error::PipelineError;
use preprocess::ClassifyTransform;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Models run when no selection is given.
pub const DEFAULT_SELECTORS: [&str; 4] = ["squeezenet1_1", "mobilenet_v2", "resnet18", "vgg16"];

/// ImageNet classifiers with a known export and evaluation transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierModel {
    SqueezeNet1_1,
    MobileNetV2,
    ResNet18,
    Vgg16,
    InceptionV3,
}

impl ClassifierModel {
    pub const ALL: [ClassifierModel; 5] = [
        ClassifierModel::SqueezeNet1_1,
        ClassifierModel::MobileNetV2,
        ClassifierModel::ResNet18,
        ClassifierModel::Vgg16,
        ClassifierModel::InceptionV3,
    ];

    pub fn selector(&self) -> &'static str {
        match self {
            ClassifierModel::SqueezeNet1_1 => "squeezenet1_1",
            ClassifierModel::MobileNetV2 => "mobilenet_v2",
            ClassifierModel::ResNet18 => "resnet18",
            ClassifierModel::Vgg16 => "vgg16",
            ClassifierModel::InceptionV3 => "inception_v3",
        }
    }

    /// Evaluation transform the default weights were published with.
    pub fn transform(&self) -> ClassifyTransform {
        match self {
            ClassifierModel::MobileNetV2 => ClassifyTransform::imagenet(232, 224),
            ClassifierModel::InceptionV3 => ClassifyTransform::imagenet(342, 299),
            ClassifierModel::SqueezeNet1_1 | ClassifierModel::ResNet18 | ClassifierModel::Vgg16 => {
                ClassifyTransform::imagenet(256, 224)
            }
        }
    }

    /// `<model_dir>/<selector>.onnx`
    pub fn model_path(&self, model_dir: &Path) -> PathBuf {
        model_dir.join(format!("{}.onnx", self.selector()))
    }
}

impl FromStr for ClassifierModel {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ClassifierModel::ALL
            .into_iter()
            .find(|m| m.selector() == wanted)
            .ok_or_else(|| PipelineError::UnsupportedModel(wanted.to_string()))
    }
}

impl fmt::Display for ClassifierModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.selector())
    }
}

/// Resolve selectors in order, logging and dropping the unknown ones.
pub fn resolve_selectors<S: AsRef<str>>(selectors: &[S]) -> Vec<ClassifierModel> {
    selectors
        .iter()
        .filter_map(|s| match s.as_ref().parse::<ClassifierModel>() {
            Ok(model) => Some(model),
            Err(_) => {
                tracing::warn!("Model '{}' is not supported, skipping.", s.as_ref());
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selectors_roundtrip() {
        for model in ClassifierModel::ALL {
            assert_eq!(model.selector().parse::<ClassifierModel>().unwrap(), model);
        }
    }

    #[test]
    fn test_unknown_selector() {
        assert!(matches!(
            "alexnet".parse::<ClassifierModel>(),
            Err(PipelineError::UnsupportedModel(name)) if name == "alexnet"
        ));
    }

    #[test]
    fn test_transforms() {
        assert_eq!(ClassifierModel::ResNet18.transform().resize_size, 256);
        assert_eq!(ClassifierModel::MobileNetV2.transform().resize_size, 232);
        assert_eq!(ClassifierModel::InceptionV3.transform().crop_size, 299);
        assert_eq!(ClassifierModel::Vgg16.transform().crop_size, 224);
    }

    #[test]
    fn test_resolve_skips_unknown_and_keeps_order() {
        let models = resolve_selectors(&["vgg16", "alexnet", "squeezenet1_1"]);
        assert_eq!(
            models,
            vec![ClassifierModel::Vgg16, ClassifierModel::SqueezeNet1_1]
        );
        assert_eq!(resolve_selectors(&DEFAULT_SELECTORS).len(), 4);
    }

    #[test]
    fn test_model_path() {
        assert_eq!(
            ClassifierModel::ResNet18.model_path(Path::new("/models")),
            PathBuf::from("/models/resnet18.onnx")
        );
    }
}
