use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
	async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		manager
			.create_table(
				Table::create()
					.table(ScanDirectories::Table)
					.if_not_exists()
					.col(ColumnDef::new(ScanDirectories::Id).uuid().not_null().primary_key())
					.col(ColumnDef::new(ScanDirectories::Path).text().not_null().unique_key())
					.col(ColumnDef::new(ScanDirectories::Enabled).boolean().not_null())
					.col(ColumnDef::new(ScanDirectories::LastScannedAt).timestamp_with_time_zone())
					.col(ColumnDef::new(ScanDirectories::FileCount).big_integer().not_null())
					.col(ColumnDef::new(ScanDirectories::CreatedAt).timestamp_with_time_zone().not_null())
					.to_owned(),
			)
			.await?;

		manager
			.create_table(
				Table::create()
					.table(SelectionSessions::Table)
					.if_not_exists()
					.col(ColumnDef::new(SelectionSessions::Id).uuid().not_null().primary_key())
					.col(ColumnDef::new(SelectionSessions::Status).string_len(16).not_null())
					.col(ColumnDef::new(SelectionSessions::CreatedAt).timestamp_with_time_zone().not_null())
					.col(ColumnDef::new(SelectionSessions::ResumedAt).timestamp_with_time_zone())
					.col(ColumnDef::new(SelectionSessions::CompletedAt).timestamp_with_time_zone())
					.col(ColumnDef::new(SelectionSessions::ProposedCount).integer().not_null())
					.col(ColumnDef::new(SelectionSessions::ValidatedCount).integer().not_null())
					.col(ColumnDef::new(SelectionSessions::SkippedCount).integer().not_null())
					.col(ColumnDef::new(SelectionSessions::CurrentGroupId).uuid())
					.col(ColumnDef::new(SelectionSessions::LastActivityAt).timestamp_with_time_zone().not_null())
					.to_owned(),
			)
			.await?;

		manager
			.create_table(
				Table::create()
					.table(DuplicateGroups::Table)
					.if_not_exists()
					.col(ColumnDef::new(DuplicateGroups::Id).uuid().not_null().primary_key())
					.col(ColumnDef::new(DuplicateGroups::FileHash).string_len(64).not_null().unique_key())
					.col(ColumnDef::new(DuplicateGroups::FileCount).integer().not_null())
					.col(ColumnDef::new(DuplicateGroups::TotalSizeBytes).big_integer().not_null())
					.col(ColumnDef::new(DuplicateGroups::Status).string_len(32).not_null())
					.col(ColumnDef::new(DuplicateGroups::OriginalFileId).uuid())
					.col(ColumnDef::new(DuplicateGroups::AutoSelectMargin).integer())
					.col(ColumnDef::new(DuplicateGroups::ReviewSessionId).uuid())
					.col(ColumnDef::new(DuplicateGroups::ReviewOrder).integer().not_null())
					.col(ColumnDef::new(DuplicateGroups::CreatedAt).timestamp_with_time_zone().not_null())
					.col(ColumnDef::new(DuplicateGroups::ResolvedAt).timestamp_with_time_zone())
					.foreign_key(
						ForeignKey::create()
							.from(DuplicateGroups::Table, DuplicateGroups::ReviewSessionId)
							.to(SelectionSessions::Table, SelectionSessions::Id),
					)
					.to_owned(),
			)
			.await?;

		manager
			.create_table(
				Table::create()
					.table(IndexedFiles::Table)
					.if_not_exists()
					.col(ColumnDef::new(IndexedFiles::Id).uuid().not_null().primary_key())
					.col(ColumnDef::new(IndexedFiles::ScanDirectoryId).uuid().not_null())
					.col(ColumnDef::new(IndexedFiles::Path).text().not_null())
					.col(ColumnDef::new(IndexedFiles::Basename).string().not_null())
					.col(ColumnDef::new(IndexedFiles::Extension).string_len(16))
					.col(ColumnDef::new(IndexedFiles::FileHash).string_len(64).not_null())
					.col(ColumnDef::new(IndexedFiles::SizeBytes).big_integer().not_null())
					.col(ColumnDef::new(IndexedFiles::FsCreatedAt).timestamp_with_time_zone().not_null())
					.col(ColumnDef::new(IndexedFiles::FsModifiedAt).timestamp_with_time_zone().not_null())
					.col(ColumnDef::new(IndexedFiles::IndexedAt).timestamp_with_time_zone().not_null())
					.col(ColumnDef::new(IndexedFiles::Width).integer())
					.col(ColumnDef::new(IndexedFiles::Height).integer())
					.col(ColumnDef::new(IndexedFiles::CaptureTime).timestamp_with_time_zone())
					.col(ColumnDef::new(IndexedFiles::CameraMake).string())
					.col(ColumnDef::new(IndexedFiles::CameraModel).string())
					.col(ColumnDef::new(IndexedFiles::GpsLatitude).double())
					.col(ColumnDef::new(IndexedFiles::GpsLongitude).double())
					.col(ColumnDef::new(IndexedFiles::Iso).integer())
					.col(ColumnDef::new(IndexedFiles::Aperture).string_len(16))
					.col(ColumnDef::new(IndexedFiles::ShutterSpeed).string_len(16))
					.col(ColumnDef::new(IndexedFiles::Orientation).small_integer())
					.col(ColumnDef::new(IndexedFiles::MetadataError).text())
					.col(ColumnDef::new(IndexedFiles::ThumbnailObjectKey).string())
					.col(ColumnDef::new(IndexedFiles::ThumbnailError).text())
					.col(ColumnDef::new(IndexedFiles::RetryCount).integer().not_null())
					.col(ColumnDef::new(IndexedFiles::DuplicateGroupId).uuid())
					.col(ColumnDef::new(IndexedFiles::IsOriginal).boolean().not_null())
					.col(ColumnDef::new(IndexedFiles::Hidden).boolean().not_null())
					.col(ColumnDef::new(IndexedFiles::HiddenCategory).string_len(16))
					.col(ColumnDef::new(IndexedFiles::HiddenRuleId).uuid())
					.col(ColumnDef::new(IndexedFiles::IsDeleted).boolean().not_null())
					.col(ColumnDef::new(IndexedFiles::ArchivePath).text())
					.col(ColumnDef::new(IndexedFiles::ArchivedAt).timestamp_with_time_zone())
					.foreign_key(
						ForeignKey::create()
							.from(IndexedFiles::Table, IndexedFiles::ScanDirectoryId)
							.to(ScanDirectories::Table, ScanDirectories::Id),
					)
					.foreign_key(
						ForeignKey::create()
							.from(IndexedFiles::Table, IndexedFiles::DuplicateGroupId)
							.to(DuplicateGroups::Table, DuplicateGroups::Id),
					)
					.to_owned(),
			)
			.await?;

		manager
			.create_index(
				Index::create()
					.name("idx_indexed_files_scan_dir_path")
					.table(IndexedFiles::Table)
					.col(IndexedFiles::ScanDirectoryId)
					.col(IndexedFiles::Path)
					.unique()
					.to_owned(),
			)
			.await?;

		manager
			.create_index(
				Index::create()
					.name("idx_indexed_files_hash")
					.table(IndexedFiles::Table)
					.col(IndexedFiles::FileHash)
					.to_owned(),
			)
			.await?;

		manager
			.create_table(
				Table::create()
					.table(SelectionPreferences::Table)
					.if_not_exists()
					.col(ColumnDef::new(SelectionPreferences::Id).uuid().not_null().primary_key())
					.col(ColumnDef::new(SelectionPreferences::PathPrefix).text().not_null())
					.col(ColumnDef::new(SelectionPreferences::Priority).integer().not_null())
					.col(ColumnDef::new(SelectionPreferences::SortOrder).integer().not_null())
					.to_owned(),
			)
			.await?;

		manager
			.create_table(
				Table::create()
					.table(CleanerJobs::Table)
					.if_not_exists()
					.col(ColumnDef::new(CleanerJobs::Id).uuid().not_null().primary_key())
					.col(ColumnDef::new(CleanerJobs::Status).string_len(16).not_null())
					.col(ColumnDef::new(CleanerJobs::Category).string_len(16).not_null())
					.col(ColumnDef::new(CleanerJobs::DryRun).boolean().not_null())
					.col(ColumnDef::new(CleanerJobs::TotalCount).integer().not_null())
					.col(ColumnDef::new(CleanerJobs::SucceededCount).integer().not_null())
					.col(ColumnDef::new(CleanerJobs::FailedCount).integer().not_null())
					.col(ColumnDef::new(CleanerJobs::SkippedCount).integer().not_null())
					.col(ColumnDef::new(CleanerJobs::SourceGroupId).uuid())
					.col(ColumnDef::new(CleanerJobs::CreatedAt).timestamp_with_time_zone().not_null())
					.col(ColumnDef::new(CleanerJobs::CompletedAt).timestamp_with_time_zone())
					.foreign_key(
						ForeignKey::create()
							.from(CleanerJobs::Table, CleanerJobs::SourceGroupId)
							.to(DuplicateGroups::Table, DuplicateGroups::Id),
					)
					.to_owned(),
			)
			.await?;

		manager
			.create_table(
				Table::create()
					.table(CleanerJobFiles::Table)
					.if_not_exists()
					.col(ColumnDef::new(CleanerJobFiles::Id).uuid().not_null().primary_key())
					.col(ColumnDef::new(CleanerJobFiles::JobId).uuid().not_null())
					.col(ColumnDef::new(CleanerJobFiles::FileId).uuid().not_null())
					.col(ColumnDef::new(CleanerJobFiles::Status).string_len(16).not_null())
					.col(ColumnDef::new(CleanerJobFiles::ArchivePath).text())
					.col(ColumnDef::new(CleanerJobFiles::Error).text())
					.col(ColumnDef::new(CleanerJobFiles::WasDryRun).boolean().not_null())
					.foreign_key(
						ForeignKey::create()
							.from(CleanerJobFiles::Table, CleanerJobFiles::JobId)
							.to(CleanerJobs::Table, CleanerJobs::Id),
					)
					.foreign_key(
						ForeignKey::create()
							.from(CleanerJobFiles::Table, CleanerJobFiles::FileId)
							.to(IndexedFiles::Table, IndexedFiles::Id),
					)
					.to_owned(),
			)
			.await?;

		manager
			.create_table(
				Table::create()
					.table(HiddenFolders::Table)
					.if_not_exists()
					.col(ColumnDef::new(HiddenFolders::Id).uuid().not_null().primary_key())
					.col(ColumnDef::new(HiddenFolders::PathPrefix).text().not_null())
					.col(ColumnDef::new(HiddenFolders::CreatedAt).timestamp_with_time_zone().not_null())
					.to_owned(),
			)
			.await?;

		manager
			.create_table(
				Table::create()
					.table(HiddenSizeRules::Table)
					.if_not_exists()
					.col(ColumnDef::new(HiddenSizeRules::Id).uuid().not_null().primary_key())
					.col(ColumnDef::new(HiddenSizeRules::MaxSizeBytes).big_integer().not_null())
					.col(ColumnDef::new(HiddenSizeRules::CreatedAt).timestamp_with_time_zone().not_null())
					.to_owned(),
			)
			.await?;

		Ok(())
	}

	async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		manager.drop_table(Table::drop().table(HiddenSizeRules::Table).to_owned()).await?;
		manager.drop_table(Table::drop().table(HiddenFolders::Table).to_owned()).await?;
		manager.drop_table(Table::drop().table(CleanerJobFiles::Table).to_owned()).await?;
		manager.drop_table(Table::drop().table(CleanerJobs::Table).to_owned()).await?;
		manager.drop_table(Table::drop().table(SelectionPreferences::Table).to_owned()).await?;
		manager.drop_table(Table::drop().table(IndexedFiles::Table).to_owned()).await?;
		manager.drop_table(Table::drop().table(DuplicateGroups::Table).to_owned()).await?;
		manager.drop_table(Table::drop().table(SelectionSessions::Table).to_owned()).await?;
		manager.drop_table(Table::drop().table(ScanDirectories::Table).to_owned()).await?;
		Ok(())
	}
}

#[derive(DeriveIden)]
enum ScanDirectories {
	Table,
	Id,
	Path,
	Enabled,
	LastScannedAt,
	FileCount,
	CreatedAt,
}

#[derive(DeriveIden)]
enum SelectionSessions {
	Table,
	Id,
	Status,
	CreatedAt,
	ResumedAt,
	CompletedAt,
	ProposedCount,
	ValidatedCount,
	SkippedCount,
	CurrentGroupId,
	LastActivityAt,
}

#[derive(DeriveIden)]
enum DuplicateGroups {
	Table,
	Id,
	FileHash,
	FileCount,
	TotalSizeBytes,
	Status,
	OriginalFileId,
	AutoSelectMargin,
	ReviewSessionId,
	ReviewOrder,
	CreatedAt,
	ResolvedAt,
}

#[derive(DeriveIden)]
enum IndexedFiles {
	Table,
	Id,
	ScanDirectoryId,
	Path,
	Basename,
	Extension,
	FileHash,
	SizeBytes,
	FsCreatedAt,
	FsModifiedAt,
	IndexedAt,
	Width,
	Height,
	CaptureTime,
	CameraMake,
	CameraModel,
	GpsLatitude,
	GpsLongitude,
	Iso,
	Aperture,
	ShutterSpeed,
	Orientation,
	MetadataError,
	ThumbnailObjectKey,
	ThumbnailError,
	RetryCount,
	DuplicateGroupId,
	IsOriginal,
	Hidden,
	HiddenCategory,
	HiddenRuleId,
	IsDeleted,
	ArchivePath,
	ArchivedAt,
}

#[derive(DeriveIden)]
enum SelectionPreferences {
	Table,
	Id,
	PathPrefix,
	Priority,
	SortOrder,
}

#[derive(DeriveIden)]
enum CleanerJobs {
	Table,
	Id,
	Status,
	Category,
	DryRun,
	TotalCount,
	SucceededCount,
	FailedCount,
	SkippedCount,
	SourceGroupId,
	CreatedAt,
	CompletedAt,
}

#[derive(DeriveIden)]
enum CleanerJobFiles {
	Table,
	Id,
	JobId,
	FileId,
	Status,
	ArchivePath,
	Error,
	WasDryRun,
}

#[derive(DeriveIden)]
enum HiddenFolders {
	Table,
	Id,
	PathPrefix,
	CreatedAt,
}

#[derive(DeriveIden)]
enum HiddenSizeRules {
	Table,
	Id,
	MaxSizeBytes,
	CreatedAt,
}
