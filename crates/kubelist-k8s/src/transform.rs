//! Conversion of raw deployments into display records

use std::time::Duration;

use chrono::{DateTime, Utc};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::PodSpec;

use kubelist_types::{DisplayRecord, Replicas};

/// Convert a k8s Deployment to a DisplayRecord, computing its age against `now`
pub fn to_display_record(deploy: &Deployment, now: DateTime<Utc>) -> DisplayRecord {
    let metadata = &deploy.metadata;
    let created_at = metadata
        .creation_timestamp
        .as_ref()
        .map(|t| t.0)
        .unwrap_or(now);

    let mut record = DisplayRecord::new(
        metadata.name.clone().unwrap_or_default(),
        metadata.namespace.clone().unwrap_or_default(),
        created_at,
    );

    // A creation time in the future (clock skew) counts as zero age
    record.age = (now - created_at).to_std().unwrap_or(Duration::ZERO);

    let mut replicas = Replicas::default();
    if let Some(spec) = &deploy.spec {
        replicas.desired = spec.replicas.unwrap_or(0);
        record.images = extract_images(spec.template.spec.as_ref());
    }
    if let Some(status) = &deploy.status {
        replicas.available = status.available_replicas.unwrap_or(0);
        replicas.ready = status.ready_replicas.unwrap_or(0);
        replicas.updated = status.updated_replicas.unwrap_or(0);
    }
    record.replicas = replicas;

    record
}

/// Images referenced by a pod spec: regular containers first, then init
/// containers, without empties or duplicates, in order of first occurrence
pub fn extract_images(spec: Option<&PodSpec>) -> Vec<String> {
    let Some(spec) = spec else {
        return Vec::new();
    };

    let init = spec.init_containers.iter().flatten();
    let mut images: Vec<String> = Vec::new();
    for container in spec.containers.iter().chain(init) {
        let Some(image) = container.image.as_deref() else {
            continue;
        };
        if !image.is_empty() && !images.iter().any(|seen| seen == image) {
            images.push(image.to_string());
        }
    }
    images
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use k8s_openapi::api::apps::v1::{DeploymentSpec, DeploymentStatus};
    use k8s_openapi::api::core::v1::{Container, PodTemplateSpec};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};

    fn container(image: &str) -> Container {
        Container {
            name: "c".to_string(),
            image: Some(image.to_string()),
            ..Default::default()
        }
    }

    fn pod_spec(main: &[&str], init: &[&str]) -> PodSpec {
        PodSpec {
            containers: main.iter().map(|i| container(i)).collect(),
            init_containers: Some(init.iter().map(|i| container(i)).collect()),
            ..Default::default()
        }
    }

    #[test]
    fn test_extract_images_dedupes_across_lists() {
        let spec = pod_spec(&["a", "a", "b"], &["", "c", "b"]);
        assert_eq!(extract_images(Some(&spec)), vec!["a", "b", "c"]);

        // Which list supplies which image does not matter for the result set
        let swapped = pod_spec(&["c", ""], &["a", "b", "a"]);
        let mut images = extract_images(Some(&swapped));
        images.sort();
        assert_eq!(images, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_extract_images_is_idempotent() {
        let spec = pod_spec(&["a", "a", "b", "", "c"], &[]);
        let once = extract_images(Some(&spec));
        let again_spec = pod_spec(&once.iter().map(String::as_str).collect::<Vec<_>>(), &[]);
        assert_eq!(extract_images(Some(&again_spec)), once);
    }

    #[test]
    fn test_extract_images_without_spec_or_image() {
        assert!(extract_images(None).is_empty());

        let spec = PodSpec {
            containers: vec![Container {
                name: "no-image".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(extract_images(Some(&spec)).is_empty());
    }

    #[test]
    fn test_to_display_record() {
        let created = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        let now = created + chrono::Duration::hours(5);

        let deploy = Deployment {
            metadata: ObjectMeta {
                name: Some("nginx-deployment".to_string()),
                namespace: Some("default".to_string()),
                creation_timestamp: Some(Time(created)),
                ..Default::default()
            },
            spec: Some(DeploymentSpec {
                replicas: Some(3),
                template: PodTemplateSpec {
                    spec: Some(pod_spec(&["nginx:1.21"], &["busybox:latest"])),
                    ..Default::default()
                },
                ..Default::default()
            }),
            status: Some(DeploymentStatus {
                available_replicas: Some(2),
                ready_replicas: Some(2),
                updated_replicas: Some(3),
                ..Default::default()
            }),
        };

        let record = to_display_record(&deploy, now);
        assert_eq!(record.name, "nginx-deployment");
        assert_eq!(record.namespace, "default");
        assert_eq!(
            record.replicas,
            Replicas {
                desired: 3,
                available: 2,
                ready: 2,
                updated: 3,
            }
        );
        assert_eq!(record.age, Duration::from_secs(5 * 3600));
        assert_eq!(record.created_at, created);
        assert_eq!(record.images, vec!["nginx:1.21", "busybox:latest"]);
    }

    #[test]
    fn test_to_display_record_defaults() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        let record = to_display_record(&Deployment::default(), now);

        assert_eq!(record.name, "");
        assert_eq!(record.replicas, Replicas::default());
        assert_eq!(record.age, Duration::ZERO);
        assert_eq!(record.created_at, now);
        assert!(record.images.is_empty());
    }

    #[test]
    fn test_future_creation_time_clamps_age() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        let deploy = Deployment {
            metadata: ObjectMeta {
                creation_timestamp: Some(Time(now + chrono::Duration::minutes(2))),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(to_display_record(&deploy, now).age, Duration::ZERO);
    }
}
